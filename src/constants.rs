//! Court geometry and tunable constants for shotchart
//!
//! All court measurements are in feet. Pixel values are derived at draw time
//! from the current canvas width.

// =============================================================================
// GRID
// =============================================================================

/// Cells per side of the square shot grid (one cell per foot of court width)
pub const GRID_SIZE: i32 = 50;

/// Offset added to raw `locX` so the left sideline lands on grid column 0
pub const LOC_X_OFFSET: f64 = 25.0;

// =============================================================================
// COURT DIMENSIONS
// =============================================================================

pub const FULL_COURT_LENGTH_FT: f64 = 94.0;
pub const COURT_LENGTH_FT: f64 = FULL_COURT_LENGTH_FT * 0.4; // Visible half-court depth
pub const COURT_WIDTH_FT: f64 = 50.0;
pub const COURT_ASPECT_RATIO: f64 = COURT_WIDTH_FT / COURT_LENGTH_FT;

pub const LINE_WIDTH_FT: f64 = 0.16; // 50mm

pub const THREE_POINT_LINE_DISTANCE: f64 = 3.0; // From sideline
pub const THREE_POINT_LINE_STRAIGHT_LENGTH: f64 = 14.0;
pub const THREE_POINT_LINE_RADIUS: f64 = 23.75;
pub const THREE_POINT_ARC_START_DEG: f64 = 180.0 - 22.5;
pub const THREE_POINT_ARC_END_DEG: f64 = 360.0 + 22.0;

pub const FREE_THROW_CIRCLE_RADIUS: f64 = 6.0;

pub const BACKBOARD_DISTANCE_TO_BACKLINE: f64 = 4.0;
pub const BACKBOARD_WIDTH: f64 = 5.0;
pub const BACKBOARD_DEPTH: f64 = 0.3;

pub const BASKET_DISTANCE_TO_BACKLINE: f64 = 5.25;
pub const BASKET_RADIUS: f64 = 0.75;

pub const RESTRICTED_LINE_LENGTH: f64 = 15.0 / 12.0;
pub const RESTRICTED_CIRCLE_RADIUS: f64 = 4.0;
pub const RESTRICTED_AREA_WIDTH: f64 = 8.0;

pub const PAINTED_AREA_WIDTH: f64 = 16.0;
pub const PAINTED_AREA_LENGTH: f64 = 19.0;

/// Free-throw circle dash pattern in CSS pixels (on, off)
pub const FREE_THROW_DASH: (f64, f64) = (10.0, 10.0);

// =============================================================================
// SHOT RENDERING
// =============================================================================

/// Accuracy that maps to the "worst" end of the color ramp
pub const ACCURACY_FLOOR: f64 = 0.25;
/// Accuracy that maps to the "best" end of the color ramp
pub const ACCURACY_CEIL: f64 = 0.60;

/// Upscale applied to the log-normalized cell size
pub const SHOT_SIZE_SCALE: f64 = 1.5;
/// Corner radius as a fraction of the drawn cell size
pub const SHOT_CORNER_RADIUS: f64 = 0.1;

// =============================================================================
// DEFAULT THEME (hex, overridable in config/shotchart.toml)
// =============================================================================

pub const DEFAULT_BACKGROUND: &str = "#ffffff";
pub const DEFAULT_LINE: &str = "#808080";
pub const DEFAULT_PAINTED_AREA: &str = "#353535";
pub const DEFAULT_HIGHLIGHT: &str = "#61d0ff";
pub const DEFAULT_ACCURACY_WORST: &str = "#6592ad"; // rgb(101, 146, 173)
pub const DEFAULT_ACCURACY_BEST: &str = "#00141e"; // rgb(0, 20, 30)

pub const DEFAULT_GRID_ALPHA: f32 = 0.02;
pub const DEFAULT_PAINTED_ALPHA: f32 = 0.15;
pub const DEFAULT_HIGHLIGHT_ALPHA: f32 = 0.2;
pub const DEFAULT_ZONE_ALPHA: f32 = 0.25;

// =============================================================================
// QUERY BRIDGE
// =============================================================================

/// Rows between cancellation-flag polls in the worker
pub const CANCEL_POLL_ROWS: usize = 5_000;

pub const DEFAULT_DATABASE_PATH: &str = "nba_db.sqlite3";
