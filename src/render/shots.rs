//! Shot cells and the faint grid overlay

use super::{Rect, Surface, Theme};
use crate::aggregate::AggregationState;
use crate::constants::{GRID_SIZE, SHOT_CORNER_RADIUS, SHOT_SIZE_SCALE};
use crate::coords::{CourtSize, GridCell};

/// Volume damping, `q * min(max(1, 10 - q / 1000), 1)`. Applied the same way
/// to a cell and to the busiest cell.
fn dampen(quantity: f64) -> f64 {
    quantity * (10.0 - quantity / 1_000.0).max(1.0).min(1.0)
}

/// Side length in pixels of a cell's rounded square.
///
/// Log-scaled against the busiest cell. Never negative; zero when the
/// ratio is undefined (no shots anywhere).
pub fn shot_draw_size(quantity: u32, most_shots: u32, section_size: f64) -> f64 {
    let shots = dampen(quantity as f64);
    let most = dampen(most_shots as f64);
    let size = section_size * ((shots + 1.0).log10() / (most + 1.0).log10()) * SHOT_SIZE_SCALE;
    if size.is_finite() { size.max(0.0) } else { 0.0 }
}

/// Draw every stored cell as a rounded square sized by volume and colored by
/// accuracy. Cells without a finite accuracy are skipped.
pub fn draw_shots<S: Surface>(
    surface: &mut S,
    state: &AggregationState,
    size: &CourtSize,
    theme: &Theme,
) {
    let section = size.section_size;
    for shot in state.sections() {
        let Some(color) = theme.accuracy_color(shot.field_goal_percentage) else {
            continue;
        };
        let side = shot_draw_size(shot.quantity, state.most_shots(), section);
        if side <= 0.0 {
            continue;
        }

        let origin = size.section_to_position(GridCell::new(shot.x, shot.y));
        let inset = (section - side) / 2.0;
        surface.fill_round_rect(
            Rect::new(origin.x + inset, origin.y + inset, side, side),
            side * SHOT_CORNER_RADIUS,
            color,
        );
    }
}

pub fn draw_grid<S: Surface>(surface: &mut S, size: &CourtSize, theme: &Theme) {
    let color = theme.line.with_alpha(theme.grid_alpha);
    let section = size.section_size;
    // 1 device pixel regardless of ratio
    let line_width = 1.0 / size.pixel_ratio;
    for i in 0..GRID_SIZE {
        for j in 0..GRID_SIZE {
            surface.stroke_rect(
                Rect::new(section * i as f64, section * j as f64, section, section),
                color,
                line_width,
            );
        }
    }
}
