//! Shotchart - NBA shot-chart visualization engine with a SQLite query bridge
//!
//! Shots are binned onto a 50x50 half-court grid, drawn as rounded squares
//! sized by volume and colored by accuracy, and aggregated over hovered,
//! dragged or zone selections.

// Core modules
pub mod cancel;
pub mod constants;
pub mod coords;
pub mod debug_logging;
pub mod settings;

// Visualization
pub mod aggregate;
pub mod engine;
pub mod interaction;
pub mod render;
pub mod zones;

// Data access
pub mod bridge;
pub mod query;

// Re-export commonly used types for convenience
pub use aggregate::{Aggregate, AggregationState, LoadSummary, RawShot, ShotInput, ShotSection};
pub use bridge::{BridgeError, DbClient, Row, WorkerError};
pub use cancel::CancellationToken;
pub use coords::{CourtSize, GridCell, Position};
pub use debug_logging::DebugLogConfig;
pub use engine::{
    CanvasEvent, EngineCallbacks, EngineError, EngineOptions, LayoutContainer, VisualizationEngine,
};
pub use interaction::{HighlightCallbackData, HoverSource, InteractionMode, SelectionRange};
pub use query::{GameResult, QueryError, ShotFilter, shots_from_rows};
pub use render::{Color, RasterCanvas, RasterSurface, Theme};
pub use settings::{AppSettings, SETTINGS_FILE, SettingsError};
pub use zones::{ZoneError, ZoneTable};
