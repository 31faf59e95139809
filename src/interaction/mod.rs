//! Interaction module - pointer hover/drag ranges and zone selection
//!
//! Pure state: every step returns a [`Transition`] telling the engine whether
//! to redraw and what, if anything, to hand to the hover callback.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::aggregate::{Aggregate, AggregationState};
use crate::coords::{CourtSize, GridCell, Position, clip_to_grid};
use crate::zones::ZoneTable;

/// Aggregate handed to the hover callback
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightCallbackData {
    pub total_shots: u64,
    pub made_shots: u64,
    /// Top-left cell of the selection
    pub section: GridCell,
    /// Screen position of `section`
    pub position: Position,
}

impl HighlightCallbackData {
    fn new(aggregate: Aggregate, section: GridCell, size: &CourtSize) -> Self {
        Self {
            total_shots: aggregate.total_shots,
            made_shots: aggregate.made_shots,
            section,
            position: size.section_to_position(section),
        }
    }
}

/// Who caused a hover callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverSource {
    /// Local pointer movement over the court
    Pointer,
    /// A selection pushed in through `set_hovered_shot` or `highlight_zone`
    External,
}

/// Externally driven cell range, inclusive on both corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRange {
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
}

impl SelectionRange {
    pub fn start(&self) -> GridCell {
        GridCell::new(self.start_x, self.start_y)
    }

    pub fn end(&self) -> GridCell {
        GridCell::new(self.end_x, self.end_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    Idle,
    HoveringCell,
    DraggingRange,
    ZoneHighlighted,
}

/// What an interaction step asks of the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Nothing visible changed
    Unchanged,
    /// Redraw the overlay without a callback
    Redraw,
    /// Redraw the overlay and report this aggregate (`None` clears)
    Emit(Option<HighlightCallbackData>),
}

/// Hover, drag and zone selection state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    start: Option<GridCell>,
    end: Option<GridCell>,
    pointer_down: bool,
    zone: Option<String>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zone selection wins over any range for display
    pub fn mode(&self) -> InteractionMode {
        if self.zone.is_some() {
            InteractionMode::ZoneHighlighted
        } else if self.pointer_down && self.start.is_some() {
            InteractionMode::DraggingRange
        } else if self.start.is_some() {
            InteractionMode::HoveringCell
        } else {
            InteractionMode::Idle
        }
    }

    /// Current range corners, unordered
    pub fn range(&self) -> Option<(GridCell, GridCell)> {
        self.start.zip(self.end)
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn is_pointer_down(&self) -> bool {
        self.pointer_down
    }

    /// Pointer moved over `cell`. With the button up the range collapses to
    /// that cell; while dragging only the far corner follows.
    pub fn pointer_move(
        &mut self,
        cell: GridCell,
        state: &AggregationState,
        size: &CourtSize,
    ) -> Transition {
        let current = if self.pointer_down { self.end } else { self.start };
        if current == Some(cell) {
            return Transition::Unchanged;
        }

        if self.pointer_down {
            self.end = Some(cell);
            if self.start.is_none() {
                self.start = Some(cell);
            }
        } else {
            self.start = Some(cell);
            self.end = Some(cell);
        }
        Transition::Emit(self.range_data(state, size))
    }

    pub fn pointer_down(&mut self) -> Transition {
        self.pointer_down = true;
        Transition::Unchanged
    }

    /// Freeze the dragged range at its far corner
    pub fn pointer_up(&mut self) -> Transition {
        self.pointer_down = false;
        self.start = self.end;
        Transition::Redraw
    }

    pub fn pointer_leave(&mut self) -> Transition {
        self.start = None;
        self.end = None;
        self.pointer_down = false;
        Transition::Emit(None)
    }

    /// Mirror a range selected elsewhere. Ignored while a local drag is in
    /// progress.
    pub fn set_hovered_range(
        &mut self,
        range: Option<SelectionRange>,
        state: &AggregationState,
        size: &CourtSize,
    ) -> Transition {
        if self.pointer_down {
            return Transition::Unchanged;
        }
        match range {
            None => {
                self.start = None;
                self.end = None;
                Transition::Emit(None)
            }
            Some(range) => {
                self.start = Some(range.start());
                self.end = Some(range.end());
                Transition::Emit(self.range_data(state, size))
            }
        }
    }

    /// Select a zone by id, or clear the selection with `None`. Unknown ids
    /// leave the state untouched.
    pub fn highlight_zone(
        &mut self,
        id: Option<&str>,
        zones: &ZoneTable,
        state: &AggregationState,
        size: &CourtSize,
    ) -> Transition {
        let Some(id) = id else {
            self.zone = None;
            return Transition::Emit(None);
        };
        let Some(cells) = zones.get(id) else {
            warn!(zone = id, "Unknown zone id, ignoring highlight");
            return Transition::Unchanged;
        };

        self.zone = Some(id.to_string());
        let aggregate = state.aggregate_cells(cells);
        let section = cells
            .iter()
            .copied()
            .reduce(|a, b| GridCell::new(a.x.min(b.x), a.y.min(b.y)))
            .unwrap_or(GridCell::new(0, 0));
        Transition::Emit(Some(HighlightCallbackData::new(aggregate, section, size)))
    }

    fn range_data(&self, state: &AggregationState, size: &CourtSize) -> Option<HighlightCallbackData> {
        let (start, end) = self.range()?;
        let aggregate = state.aggregate_range(start, end);
        let corner = match clip_to_grid(start, end) {
            Some((min, _)) => min,
            None => GridCell::new(start.x.min(end.x), start.y.min(end.y)),
        };
        Some(HighlightCallbackData::new(aggregate, corner, size))
    }
}
