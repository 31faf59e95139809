//! Court rendering: drawing-surface abstraction, raster backend, court and
//! shot layers, and the base/zone render caches.
//!
//! All drawing calls take CSS-pixel coordinates. A surface applies its own
//! device-pixel scale, the same way a 2D canvas context is scaled once after
//! resize.

mod cache;
mod color;
mod court;
mod highlight;
mod path;
mod raster;
mod shots;

pub use cache::{RenderCache, ZoneEdge, draw_base_layer, zone_outline};
pub use color::{Color, ColorParseError, Theme};
pub use court::draw_court;
pub use highlight::{draw_range_highlight, draw_zone_overlay};
pub use path::{Path, deg_to_rad};
pub use raster::{RasterCanvas, RasterSurface};
pub use shots::{draw_grid, draw_shots, shot_draw_size};

use crate::coords::CourtSize;

/// Axis-aligned rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// The 2D raster operations the renderer needs from a drawing backend.
pub trait Surface {
    /// Opaque copy of the surface's pixels
    type Snapshot;

    /// Reallocate the backing store for a new court size. Clears the surface.
    fn resize(&mut self, size: &CourtSize);

    /// Fill the whole surface, replacing existing pixels
    fn clear(&mut self, color: Color);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f64) {
        let mut path = Path::new();
        path.rect(rect.x, rect.y, rect.width, rect.height);
        self.stroke_path(&path, color, line_width);
    }

    fn fill_round_rect(&mut self, rect: Rect, radius: f64, color: Color);

    fn stroke_path(&mut self, path: &Path, color: Color, line_width: f64);

    /// Capture the current pixels, or `None` when the backend cannot
    /// snapshot. Callers then redraw every frame.
    fn snapshot(&self) -> Option<Self::Snapshot>;

    /// Replace the surface contents with a snapshot
    fn restore(&mut self, snapshot: &Self::Snapshot);

    /// Alpha-composite a snapshot over the current contents
    fn composite(&mut self, snapshot: &Self::Snapshot);

    /// A blank surface with the same size and scale, for offscreen layers
    fn offscreen(&self) -> Option<Self>
    where
        Self: Sized;
}

/// A drawing target that may or may not provide a 2D context.
pub trait Canvas {
    type Surface: Surface;

    fn context_2d(&mut self) -> Option<Self::Surface>;
}
