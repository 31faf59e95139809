//! Visualization engine - owns the surface, shot data, caches and
//! interaction state, and turns canvas events into redraws and callbacks.

use std::path::Path as FsPath;

use thiserror::Error;
use tracing::{debug, info};

use crate::aggregate::{AggregationState, LoadSummary, RawShot, ShotInput};
use crate::cancel::CancellationToken;
use crate::coords::{CourtSize, Position};
use crate::interaction::{
    HighlightCallbackData, HoverSource, InteractionState, SelectionRange, Transition,
};
use crate::render::{
    Canvas, RenderCache, Surface, Theme, draw_base_layer, draw_range_highlight,
};
use crate::zones::{ZoneError, ZoneTable};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("2D drawing context is not available")]
    ContextUnavailable,
    #[error(transparent)]
    Zones(#[from] ZoneError),
}

/// The element whose content box sizes the court
pub trait LayoutContainer {
    /// Content-box width in CSS pixels
    fn content_width(&self) -> f64;

    /// Backing-store pixels per CSS pixel
    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }

    /// Start delivering resize notifications. The container stops once
    /// `token` is cancelled.
    fn observe(&mut self, token: CancellationToken) {
        let _ = token;
    }
}

/// Input events delivered by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasEvent {
    PointerMove(Position),
    PointerDown,
    PointerUp,
    PointerLeave,
    Resize,
}

pub type HoverCallback = Box<dyn FnMut(Option<HighlightCallbackData>, HoverSource)>;

pub struct EngineCallbacks {
    pub on_hover: HoverCallback,
}

impl EngineCallbacks {
    pub fn new(on_hover: impl FnMut(Option<HighlightCallbackData>, HoverSource) + 'static) -> Self {
        Self {
            on_hover: Box::new(on_hover),
        }
    }

    /// Callbacks that ignore every notification
    pub fn noop() -> Self {
        Self::new(|_, _| {})
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub theme: Theme,
    pub zones: ZoneTable,
}

pub struct VisualizationEngine<S: Surface, C: LayoutContainer> {
    surface: S,
    container: C,
    callbacks: EngineCallbacks,
    theme: Theme,
    zones: ZoneTable,
    size: CourtSize,
    shots: AggregationState,
    interaction: InteractionState,
    cache: RenderCache<S::Snapshot>,
    listeners: CancellationToken,
}

impl<S: Surface, C: LayoutContainer> VisualizationEngine<S, C> {
    /// Bind to a canvas and container, size the surface and draw once.
    ///
    /// Fails when the canvas has no 2D context; no engine exists then.
    pub fn new<K>(
        canvas: &mut K,
        mut container: C,
        callbacks: EngineCallbacks,
        options: EngineOptions,
    ) -> Result<Self, EngineError>
    where
        K: Canvas<Surface = S>,
    {
        let surface = canvas.context_2d().ok_or(EngineError::ContextUnavailable)?;

        let listeners = CancellationToken::new();
        container.observe(listeners.clone());

        let size = CourtSize::from_width(container.content_width(), container.device_pixel_ratio());
        let mut engine = Self {
            surface,
            container,
            callbacks,
            theme: options.theme,
            zones: options.zones,
            size,
            shots: AggregationState::new(),
            interaction: InteractionState::new(),
            cache: RenderCache::new(),
            listeners,
        };
        engine.surface.resize(&engine.size);
        engine.draw();
        info!(
            width = engine.size.width,
            height = engine.size.height,
            zones = engine.zones.len(),
            "Visualization engine ready"
        );
        Ok(engine)
    }

    /// Replace the shot data. Invalidates the base layer only.
    pub fn set_shot_data(&mut self, shots: &[ShotInput]) -> LoadSummary {
        let summary = self.shots.set_shot_data(shots);
        self.cache.invalidate_base();
        self.draw();
        summary
    }

    /// Add individual shots to the current data
    pub fn accumulate_shots(&mut self, shots: &[RawShot]) -> LoadSummary {
        let summary = self.shots.accumulate(shots);
        self.cache.invalidate_base();
        self.draw();
        summary
    }

    pub fn set_hovered_shot(&mut self, range: Option<SelectionRange>) {
        let transition = self
            .interaction
            .set_hovered_range(range, &self.shots, &self.size);
        self.apply(transition, HoverSource::External);
    }

    pub fn highlight_zone(&mut self, id: Option<&str>) {
        let transition = self
            .interaction
            .highlight_zone(id, &self.zones, &self.shots, &self.size);
        self.apply(transition, HoverSource::External);
    }

    /// Swap the zone table. Zone caches rebuild lazily; a highlighted zone
    /// that no longer exists is cleared.
    pub fn set_zones(&mut self, zones: ZoneTable) {
        self.zones = zones;
        self.cache.invalidate_zones();
        let missing = self
            .interaction
            .zone()
            .is_some_and(|id| !self.zones.contains(id));
        if missing {
            let transition =
                self.interaction
                    .highlight_zone(None, &self.zones, &self.shots, &self.size);
            self.apply(transition, HoverSource::External);
            return;
        }
        self.draw();
    }

    pub fn load_zones(&mut self, path: &FsPath) -> Result<(), EngineError> {
        let zones = ZoneTable::load(path)?;
        self.set_zones(zones);
        Ok(())
    }

    /// Deliver a host event. Ignored once the engine is destroyed.
    pub fn handle_event(&mut self, event: CanvasEvent) {
        if self.listeners.is_cancelled() {
            return;
        }
        match event {
            CanvasEvent::PointerMove(position) => {
                let cell = self.size.position_to_section(position);
                let transition = self.interaction.pointer_move(cell, &self.shots, &self.size);
                self.apply(transition, HoverSource::Pointer);
            }
            CanvasEvent::PointerDown => {
                let transition = self.interaction.pointer_down();
                self.apply(transition, HoverSource::Pointer);
            }
            CanvasEvent::PointerUp => {
                let transition = self.interaction.pointer_up();
                self.apply(transition, HoverSource::Pointer);
            }
            CanvasEvent::PointerLeave => {
                let transition = self.interaction.pointer_leave();
                self.apply(transition, HoverSource::Pointer);
            }
            CanvasEvent::Resize => self.resize(),
        }
    }

    /// Detach every listener. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if self.listeners.cancel() {
            debug!("Visualization engine destroyed");
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.listeners.is_cancelled()
    }

    pub fn size(&self) -> &CourtSize {
        &self.size
    }

    pub fn shots(&self) -> &AggregationState {
        &self.shots
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn zones(&self) -> &ZoneTable {
        &self.zones
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn cache(&self) -> &RenderCache<S::Snapshot> {
        &self.cache
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    fn resize(&mut self) {
        self.size = CourtSize::from_width(
            self.container.content_width(),
            self.container.device_pixel_ratio(),
        );
        self.surface.resize(&self.size);
        self.cache.invalidate_all();

        let mut rebuilt = 0;
        for (id, cells) in self.zones.iter() {
            if self
                .cache
                .cache_zone(&self.surface, id, cells, &self.size, &self.theme)
            {
                rebuilt += 1;
            }
        }
        debug!(
            width = self.size.width,
            height = self.size.height,
            zones = rebuilt,
            "Resized court"
        );
        self.draw();
    }

    fn apply(&mut self, transition: Transition, source: HoverSource) {
        match transition {
            Transition::Unchanged => {}
            Transition::Redraw => self.draw(),
            Transition::Emit(data) => {
                (self.callbacks.on_hover)(data, source);
                self.draw();
            }
        }
    }

    /// Base layer (cached when possible) plus the current selection overlay
    fn draw(&mut self) {
        draw_base_layer(
            &mut self.surface,
            &mut self.cache,
            &self.shots,
            &self.size,
            &self.theme,
        );

        if let Some(id) = self.interaction.zone() {
            if let Some(cells) = self.zones.get(id) {
                self.cache
                    .draw_zone(&mut self.surface, id, cells, &self.size, &self.theme);
            }
        } else if let Some((start, end)) = self.interaction.range() {
            draw_range_highlight(&mut self.surface, &self.size, &self.theme, start, end);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    use image::Rgba;

    use super::*;
    use crate::coords::GridCell;
    use crate::render::{RasterCanvas, RasterSurface};

    struct FixedContainer {
        width: f64,
        ratio: f64,
        observing: Option<CancellationToken>,
    }

    impl FixedContainer {
        fn new(width: f64) -> Self {
            Self {
                width,
                ratio: 1.0,
                observing: None,
            }
        }
    }

    impl LayoutContainer for FixedContainer {
        fn content_width(&self) -> f64 {
            self.width
        }

        fn device_pixel_ratio(&self) -> f64 {
            self.ratio
        }

        fn observe(&mut self, token: CancellationToken) {
            self.observing = Some(token);
        }
    }

    type Calls = Rc<RefCell<Vec<(Option<HighlightCallbackData>, HoverSource)>>>;

    fn engine_with(zones: ZoneTable) -> (VisualizationEngine<RasterSurface, FixedContainer>, Calls) {
        let calls: Calls = Rc::default();
        let sink = calls.clone();
        let engine = VisualizationEngine::new(
            &mut RasterCanvas::new(),
            FixedContainer::new(500.0),
            EngineCallbacks::new(move |data, source| sink.borrow_mut().push((data, source))),
            EngineOptions {
                theme: Theme::default(),
                zones,
            },
        )
        .unwrap();
        (engine, calls)
    }

    fn two_cells() -> Vec<ShotInput> {
        vec![
            ShotInput {
                loc_x: -25.0,
                loc_y: 0.0,
                total_shots: 4,
                total_made: 3,
            },
            ShotInput {
                loc_x: -24.0,
                loc_y: 0.0,
                total_shots: 5,
                total_made: 0,
            },
        ]
    }

    fn quad_zone() -> ZoneTable {
        ZoneTable::new(BTreeMap::from([(
            "quad".to_string(),
            vec![
                GridCell::new(0, 0),
                GridCell::new(1, 0),
                GridCell::new(0, 1),
                GridCell::new(1, 1),
            ],
        )]))
    }

    #[test]
    fn test_construct_without_context_fails() {
        let result = VisualizationEngine::new(
            &mut RasterCanvas::detached(),
            FixedContainer::new(500.0),
            EngineCallbacks::noop(),
            EngineOptions::default(),
        );
        assert!(matches!(result, Err(EngineError::ContextUnavailable)));
    }

    #[test]
    fn test_construct_sizes_and_draws() {
        let (engine, calls) = engine_with(ZoneTable::default());
        assert_eq!(engine.size().section_size, 10.0);
        assert_eq!(engine.surface().image().dimensions(), (500, 376));
        assert!(engine.cache().has_base());
        assert!(engine.container.observing.is_some());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_drag_emits_range_aggregate() {
        let (mut engine, calls) = engine_with(ZoneTable::default());
        engine.set_shot_data(&two_cells());

        engine.handle_event(CanvasEvent::PointerMove(Position::new(5.0, 5.0)));
        engine.handle_event(CanvasEvent::PointerDown);
        engine.handle_event(CanvasEvent::PointerMove(Position::new(15.0, 5.0)));

        let calls = calls.borrow();
        assert_eq!(calls.len(), 2);
        let (last, source) = calls[1];
        let last = last.unwrap();
        assert_eq!((last.total_shots, last.made_shots), (9, 3));
        assert_eq!(source, HoverSource::Pointer);
    }

    #[test]
    fn test_external_range_beyond_grid_draws_clipped() {
        let (mut engine, calls) = engine_with(ZoneTable::default());
        engine.set_shot_data(&two_cells());
        // Cell (45,20) is open court outside the arc
        let white = Some(Rgba([255, 255, 255, 255]));
        assert_eq!(engine.surface().pixel(455, 205), white);

        engine.set_hovered_shot(Some(SelectionRange {
            start_x: i32::MAX,
            start_y: 0,
            end_x: i32::MAX,
            end_y: 0,
        }));
        let (data, source) = calls.borrow()[0];
        assert_eq!(data.unwrap().total_shots, 0);
        assert_eq!(source, HoverSource::External);

        engine.set_hovered_shot(Some(SelectionRange {
            start_x: 0,
            start_y: 0,
            end_x: 5_000,
            end_y: 5_000,
        }));
        assert_eq!(calls.borrow()[1].0.unwrap().total_shots, 9);
        assert_ne!(engine.surface().pixel(455, 205), white);
    }

    #[test]
    fn test_pointer_leave_emits_null() {
        let (mut engine, calls) = engine_with(ZoneTable::default());
        engine.handle_event(CanvasEvent::PointerMove(Position::new(5.0, 5.0)));
        engine.handle_event(CanvasEvent::PointerLeave);
        assert_eq!(calls.borrow().last().map(|c| c.0), Some(None));
    }

    #[test]
    fn test_shot_data_keeps_zone_caches() {
        let (mut engine, _) = engine_with(quad_zone());
        engine.highlight_zone(Some("quad"));
        assert!(engine.cache().has_zone("quad"));

        engine.set_shot_data(&two_cells());
        assert!(engine.cache().has_zone("quad"));
        assert!(engine.cache().has_base());
    }

    #[test]
    fn test_highlight_zone_is_external() {
        let (mut engine, calls) = engine_with(quad_zone());
        engine.set_shot_data(&two_cells());
        engine.highlight_zone(Some("quad"));
        engine.highlight_zone(None);

        let calls = calls.borrow();
        let (data, source) = calls[0];
        assert_eq!(data.unwrap().total_shots, 9);
        assert_eq!(source, HoverSource::External);
        assert_eq!(calls[1].0, None);
    }

    #[test]
    fn test_zone_overlay_drawn_over_base() {
        let (mut engine, _) = engine_with(quad_zone());
        // Cell (1,1) is clear of court lines
        let before = engine.surface().pixel(15, 15);
        assert_eq!(before, Some(Rgba([255, 255, 255, 255])));

        engine.highlight_zone(Some("quad"));
        assert_ne!(engine.surface().pixel(15, 15), before);

        engine.highlight_zone(None);
        assert_eq!(engine.surface().pixel(15, 15), before);
    }

    #[test]
    fn test_resize_rebuilds_zones_eagerly() {
        let (mut engine, _) = engine_with(quad_zone());
        engine.container_mut().width = 250.0;
        engine.container_mut().ratio = 2.0;
        engine.handle_event(CanvasEvent::Resize);

        assert_eq!(engine.size().section_size, 5.0);
        assert_eq!(engine.surface().image().dimensions(), (500, 376));
        assert!(engine.cache().has_zone("quad"));
        assert!(engine.cache().has_base());
    }

    #[test]
    fn test_set_zones_invalidates_and_clears_missing() {
        let (mut engine, calls) = engine_with(quad_zone());
        engine.highlight_zone(Some("quad"));
        engine.set_zones(ZoneTable::basic_zones());

        assert_eq!(engine.interaction().zone(), None);
        assert!(!engine.cache().has_zone("quad"));
        assert_eq!(calls.borrow().last().map(|c| c.0), Some(None));
    }

    #[test]
    fn test_destroy_is_idempotent_and_detaches() {
        let (mut engine, calls) = engine_with(ZoneTable::default());
        engine.destroy();
        engine.destroy();
        assert!(engine.is_destroyed());
        assert!(engine.container.observing.as_ref().unwrap().is_cancelled());

        engine.handle_event(CanvasEvent::PointerMove(Position::new(5.0, 5.0)));
        assert!(calls.borrow().is_empty());
    }
}
