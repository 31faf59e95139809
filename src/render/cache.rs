//! Cached rasters for the base layer and per-zone overlays

use std::collections::HashMap;

use tracing::debug;

use super::court::draw_court;
use super::highlight::draw_zone_overlay;
use super::shots::{draw_grid, draw_shots};
use super::{Surface, Theme};
use crate::aggregate::AggregationState;
use crate::coords::{CourtSize, GridCell};
use crate::zones::cell_set;

/// Side of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ZoneEdge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Edges of the zone's cells that border a non-member. Edges shared by two
/// member cells are left out, so the result outlines the union.
pub fn zone_outline(cells: &[GridCell]) -> Vec<(GridCell, ZoneEdge)> {
    let members = cell_set(cells);
    let mut sorted: Vec<GridCell> = members.iter().copied().collect();
    sorted.sort();

    let mut edges = Vec::new();
    for cell in sorted {
        let neighbors = [
            (ZoneEdge::Top, GridCell::new(cell.x, cell.y - 1)),
            (ZoneEdge::Right, GridCell::new(cell.x + 1, cell.y)),
            (ZoneEdge::Bottom, GridCell::new(cell.x, cell.y + 1)),
            (ZoneEdge::Left, GridCell::new(cell.x - 1, cell.y)),
        ];
        for (edge, neighbor) in neighbors {
            if !members.contains(&neighbor) {
                edges.push((cell, edge));
            }
        }
    }
    edges
}

/// Snapshots of the base layer and of each zone overlay.
///
/// The base layer depends on shot data and size; zone overlays depend on
/// size and the zone table only.
#[derive(Debug)]
pub struct RenderCache<Snap> {
    base: Option<Snap>,
    zones: HashMap<String, Snap>,
}

impl<Snap> Default for RenderCache<Snap> {
    fn default() -> Self {
        Self {
            base: None,
            zones: HashMap::new(),
        }
    }
}

impl<Snap> RenderCache<Snap> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    pub fn has_zone(&self, id: &str) -> bool {
        self.zones.contains_key(id)
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    pub fn invalidate_base(&mut self) {
        if self.base.take().is_some() {
            debug!("Base layer cache invalidated");
        }
    }

    pub fn invalidate_zones(&mut self) {
        if !self.zones.is_empty() {
            debug!(zones = self.zones.len(), "Zone caches invalidated");
            self.zones.clear();
        }
    }

    pub fn invalidate_all(&mut self) {
        self.invalidate_base();
        self.invalidate_zones();
    }

    /// Render a zone overlay offscreen and keep its snapshot. Returns false
    /// when the backend cannot draw offscreen or snapshot.
    pub fn cache_zone<S>(
        &mut self,
        surface: &S,
        id: &str,
        cells: &[GridCell],
        size: &CourtSize,
        theme: &Theme,
    ) -> bool
    where
        S: Surface<Snapshot = Snap>,
    {
        let Some(mut layer) = surface.offscreen() else {
            return false;
        };
        draw_zone_overlay(&mut layer, size, theme, cells);
        match layer.snapshot() {
            Some(snapshot) => {
                self.zones.insert(id.to_string(), snapshot);
                true
            }
            None => false,
        }
    }

    /// Composite a zone overlay, caching it first if needed. Falls back to
    /// drawing directly when caching is unavailable.
    pub fn draw_zone<S>(
        &mut self,
        surface: &mut S,
        id: &str,
        cells: &[GridCell],
        size: &CourtSize,
        theme: &Theme,
    ) where
        S: Surface<Snapshot = Snap>,
    {
        if !self.zones.contains_key(id) && !self.cache_zone(surface, id, cells, size, theme) {
            draw_zone_overlay(surface, size, theme, cells);
            return;
        }
        if let Some(snapshot) = self.zones.get(id) {
            surface.composite(snapshot);
        }
    }
}

/// Blit the cached base layer, or draw court, shots and grid and cache the
/// result. Returns true on a cache hit.
pub fn draw_base_layer<S: Surface>(
    surface: &mut S,
    cache: &mut RenderCache<S::Snapshot>,
    state: &AggregationState,
    size: &CourtSize,
    theme: &Theme,
) -> bool {
    if let Some(snapshot) = &cache.base {
        surface.restore(snapshot);
        return true;
    }

    draw_court(surface, size, theme);
    draw_shots(surface, state, size, theme);
    draw_grid(surface, size, theme);

    cache.base = surface.snapshot();
    if cache.base.is_some() {
        debug!(cells = state.len(), "Base layer cached");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ShotInput;
    use crate::render::{Color, RasterSurface};
    use image::Rgba;

    fn setup() -> (RasterSurface, CourtSize) {
        let size = CourtSize::from_width(500.0, 1.0);
        let mut surface = RasterSurface::new();
        surface.resize(&size);
        (surface, size)
    }

    #[test]
    fn test_single_cell_outline() {
        let edges = zone_outline(&[GridCell::new(4, 4)]);
        assert_eq!(edges.len(), 4);
    }

    #[test]
    fn test_outline_skips_shared_edges() {
        // 2x2 block: 8 outer edges, the 4 inner ones are shared
        let cells = [
            GridCell::new(0, 0),
            GridCell::new(1, 0),
            GridCell::new(0, 1),
            GridCell::new(1, 1),
        ];
        let edges = zone_outline(&cells);
        assert_eq!(edges.len(), 8);
        assert!(!edges.contains(&(GridCell::new(0, 0), ZoneEdge::Right)));
        assert!(!edges.contains(&(GridCell::new(0, 0), ZoneEdge::Bottom)));
        assert!(edges.contains(&(GridCell::new(0, 0), ZoneEdge::Top)));
        assert!(edges.contains(&(GridCell::new(1, 1), ZoneEdge::Right)));
    }

    #[test]
    fn test_outline_handles_diagonal_and_duplicates() {
        let cells = [GridCell::new(0, 0), GridCell::new(1, 1), GridCell::new(1, 1)];
        assert_eq!(zone_outline(&cells).len(), 8);
        assert!(zone_outline(&[]).is_empty());
    }

    #[test]
    fn test_base_layer_cached_then_restored() {
        let (mut surface, size) = setup();
        let theme = Theme::default();
        let mut cache = RenderCache::new();
        let mut state = AggregationState::new();
        state.set_shot_data(&[ShotInput {
            loc_x: 0.5,
            loc_y: 10.5,
            total_shots: 4,
            total_made: 2,
        }]);

        assert!(!draw_base_layer(&mut surface, &mut cache, &state, &size, &theme));
        assert!(cache.has_base());
        let first = surface.image().clone();

        surface.clear(Color::rgb(1, 1, 1));
        assert!(draw_base_layer(&mut surface, &mut cache, &state, &size, &theme));
        assert_eq!(surface.image(), &first);

        cache.invalidate_base();
        assert!(!cache.has_base());
    }

    #[test]
    fn test_zone_cache_composites_overlay() {
        let (mut surface, size) = setup();
        let theme = Theme::default();
        let mut cache = RenderCache::new();
        surface.clear(theme.background);

        let cells = [GridCell::new(0, 0), GridCell::new(1, 0)];
        assert!(cache.cache_zone(&surface, "corner", &cells, &size, &theme));
        assert!(cache.has_zone("corner"));
        // Caching draws offscreen only
        assert_eq!(surface.pixel(5, 5), Some(Rgba([255, 255, 255, 255])));

        cache.draw_zone(&mut surface, "corner", &cells, &size, &theme);
        assert_ne!(surface.pixel(5, 5), Some(Rgba([255, 255, 255, 255])));

        cache.invalidate_zones();
        assert_eq!(cache.zone_count(), 0);
    }

    #[test]
    fn test_cached_zone_matches_direct_drawing() {
        let (mut cached, size) = setup();
        let (mut direct, _) = setup();
        let theme = Theme::default();
        cached.clear(theme.background);
        direct.clear(theme.background);
        let cells = [GridCell::new(2, 2), GridCell::new(2, 3), GridCell::new(3, 3)];

        let mut cache = RenderCache::new();
        cache.draw_zone(&mut cached, "z", &cells, &size, &theme);
        draw_zone_overlay(&mut direct, &size, &theme, &cells);

        let a = cached.pixel(25, 25).unwrap();
        let b = direct.pixel(25, 25).unwrap();
        for channel in 0..4 {
            assert!(a[channel].abs_diff(b[channel]) <= 2, "{:?} vs {:?}", a, b);
        }
    }
}
