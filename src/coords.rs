//! Conversions between screen pixels, grid cells, and court feet
//!
//! Everything here is a pure function of the current [`CourtSize`].

use serde::{Deserialize, Serialize};

use crate::constants::{COURT_ASPECT_RATIO, COURT_WIDTH_FT, GRID_SIZE};

/// Integer grid coordinates. May lie outside the grid; callers bounds-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn in_bounds(&self) -> bool {
        (0..GRID_SIZE).contains(&self.x) && (0..GRID_SIZE).contains(&self.y)
    }
}

/// The part of the closed rectangle between two corners (in any order) that
/// lies on the grid, as `(min, max)`. `None` when the rectangle misses the
/// grid entirely.
pub fn clip_to_grid(start: GridCell, end: GridCell) -> Option<(GridCell, GridCell)> {
    let min = GridCell::new(start.x.min(end.x).max(0), start.y.min(end.y).max(0));
    let max = GridCell::new(
        start.x.max(end.x).min(GRID_SIZE - 1),
        start.y.max(end.y).min(GRID_SIZE - 1),
    );
    (min.x <= max.x && min.y <= max.y).then_some((min, max))
}

/// A point in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Current drawing dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourtSize {
    pub width: f64,
    pub height: f64,
    /// Pixel size of one grid cell
    pub section_size: f64,
    /// Backing-store pixels per CSS pixel
    pub pixel_ratio: f64,
}

impl CourtSize {
    /// Derive the court size from the container's content width
    pub fn from_width(width: f64, pixel_ratio: f64) -> Self {
        let width = width.max(0.0);
        Self {
            width,
            height: width / COURT_ASPECT_RATIO,
            section_size: width / GRID_SIZE as f64,
            pixel_ratio: if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 },
        }
    }

    /// Backing-store dimensions in device pixels
    pub fn device_pixels(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).round() as u32,
            (self.height * self.pixel_ratio).round() as u32,
        )
    }

    pub fn feet_to_pixels(&self, feet: f64) -> f64 {
        feet * (self.width / COURT_WIDTH_FT)
    }

    /// Top-left pixel of a grid cell
    pub fn section_to_position(&self, cell: GridCell) -> Position {
        Position::new(
            cell.x as f64 * self.section_size,
            cell.y as f64 * self.section_size,
        )
    }

    /// Grid cell under a pixel position.
    ///
    /// X floors outside a band of two cells either side of the court's
    /// vertical centerline and rounds inside it, which keeps the centerline
    /// column stable under pointer jitter. Y always floors.
    pub fn position_to_section(&self, position: Position) -> GridCell {
        if self.section_size <= 0.0 {
            return GridCell::new(0, 0);
        }

        let center = self.width / 2.0;
        let center_left = center - self.section_size * 2.0;
        let center_right = center + self.section_size * 2.0;

        let scaled_x = position.x / self.section_size;
        let x = if position.x < center_left || position.x > center_right {
            scaled_x.floor()
        } else {
            // Halves round toward +inf
            (scaled_x + 0.5).floor()
        };
        let y = (position.y / self.section_size).floor();

        GridCell::new(saturate(x), saturate(y))
    }
}

fn saturate(value: f64) -> i32 {
    if value.is_nan() {
        0
    } else {
        value.clamp(i32::MIN as f64, i32::MAX as f64) as i32
    }
}
