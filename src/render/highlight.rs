//! Interaction overlays: the selected range and zone highlights

use super::cache::{ZoneEdge, zone_outline};
use super::path::Path;
use super::{Rect, Surface, Theme};
use crate::constants::LINE_WIDTH_FT;
use crate::coords::{CourtSize, GridCell, clip_to_grid};
use crate::zones::cell_set;

/// Outline and tint the closed rectangle of cells between `start` and `end`,
/// clipped to the grid. Either corner may be the larger one.
pub fn draw_range_highlight<S: Surface>(
    surface: &mut S,
    size: &CourtSize,
    theme: &Theme,
    start: GridCell,
    end: GridCell,
) {
    let Some((min, max)) = clip_to_grid(start, end) else {
        return;
    };

    let origin = size.section_to_position(min);
    let far = size.section_to_position(GridCell::new(max.x + 1, max.y + 1));
    let rect = Rect::new(origin.x, origin.y, far.x - origin.x, far.y - origin.y);

    surface.stroke_rect(rect, theme.highlight, size.feet_to_pixels(LINE_WIDTH_FT));
    surface.fill_rect(rect, theme.highlight.with_alpha(theme.highlight_alpha));
}

/// Tint the union of a zone's cells and stroke only its outer boundary.
pub fn draw_zone_overlay<S: Surface>(
    surface: &mut S,
    size: &CourtSize,
    theme: &Theme,
    cells: &[GridCell],
) {
    let section = size.section_size;
    let fill = theme.highlight.with_alpha(theme.zone_alpha);

    // Each cell once, so overlapping fills never darken the union
    let mut unique: Vec<GridCell> = cell_set(cells).into_iter().collect();
    unique.sort();
    for cell in &unique {
        let origin = size.section_to_position(*cell);
        surface.fill_rect(Rect::new(origin.x, origin.y, section, section), fill);
    }

    let mut outline = Path::new();
    for (cell, edge) in zone_outline(cells) {
        let x0 = cell.x as f64 * section;
        let y0 = cell.y as f64 * section;
        let (x1, y1) = (x0 + section, y0 + section);
        match edge {
            ZoneEdge::Top => outline.move_to(x0, y0).line_to(x1, y0),
            ZoneEdge::Right => outline.move_to(x1, y0).line_to(x1, y1),
            ZoneEdge::Bottom => outline.move_to(x0, y1).line_to(x1, y1),
            ZoneEdge::Left => outline.move_to(x0, y0).line_to(x0, y1),
        };
    }
    surface.stroke_path(&outline, theme.highlight, size.feet_to_pixels(LINE_WIDTH_FT));
}
