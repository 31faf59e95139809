//! Shot inputs, per-cell sections, and summed aggregates

use serde::{Deserialize, Serialize};

use crate::constants::{GRID_SIZE, LOC_X_OFFSET};
use crate::coords::GridCell;

/// Pre-aggregated shots at one court location, as returned by the
/// court-shot query. Coordinates are in feet, X before the +25 offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotInput {
    pub loc_x: f64,
    pub loc_y: f64,
    pub total_shots: u32,
    pub total_made: u32,
}

/// A single shot attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawShot {
    pub loc_x: f64,
    pub loc_y: f64,
    pub shot_made: bool,
}

/// Map key for a grid cell: `x + y * GRID_SIZE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridKey(pub u32);

impl GridKey {
    /// Key for an in-grid cell. Out-of-grid cells have no key, so two
    /// distinct cells can never alias.
    pub fn from_cell(cell: GridCell) -> Option<Self> {
        cell.in_bounds()
            .then(|| GridKey((cell.x + cell.y * GRID_SIZE) as u32))
    }

    pub fn cell(&self) -> GridCell {
        let key = self.0 as i32;
        GridCell::new(key % GRID_SIZE, key / GRID_SIZE)
    }
}

/// Bin a court location (feet) into its grid cell.
pub fn bin_location(loc_x: f64, loc_y: f64) -> Option<GridCell> {
    if !loc_x.is_finite() || !loc_y.is_finite() {
        return None;
    }
    let cell = GridCell::new(
        (loc_x + LOC_X_OFFSET).floor() as i32,
        loc_y.floor() as i32,
    );
    cell.in_bounds().then_some(cell)
}

/// Aggregated shots for one grid cell
#[derive(Debug, Clone)]
pub struct ShotSection {
    pub x: i32,
    pub y: i32,
    /// Always `total_made + total_missed`
    pub quantity: u32,
    /// `total_made / quantity`; NaN when `quantity == 0`
    pub field_goal_percentage: f64,
    pub total_made: u32,
    pub total_missed: u32,
}

impl ShotSection {
    pub fn new(cell: GridCell, total_made: u32, total_missed: u32) -> Self {
        let mut section = Self {
            x: cell.x,
            y: cell.y,
            quantity: 0,
            field_goal_percentage: 0.0,
            total_made,
            total_missed,
        };
        section.recompute();
        section
    }

    pub fn cell(&self) -> GridCell {
        GridCell::new(self.x, self.y)
    }

    /// Restore the quantity/percentage invariant after counts change.
    pub(crate) fn recompute(&mut self) {
        self.quantity = self.total_made.saturating_add(self.total_missed);
        // 0/0 is NaN on purpose; consumers treat non-finite accuracy as "no data"
        self.field_goal_percentage = self.total_made as f64 / self.quantity as f64;
    }

    /// Accuracy if the cell has any attempts
    pub fn accuracy(&self) -> Option<f64> {
        self.field_goal_percentage
            .is_finite()
            .then_some(self.field_goal_percentage)
    }
}

/// Quantity and percentage follow from the counts, and the percentage is
/// NaN for empty cells, so equality compares the cell and counts only.
impl PartialEq for ShotSection {
    fn eq(&self, other: &Self) -> bool {
        self.cell() == other.cell()
            && self.total_made == other.total_made
            && self.total_missed == other.total_missed
    }
}

/// Summed shots over a selection. Never divides; percentages are the
/// consumer's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub total_shots: u64,
    pub made_shots: u64,
}

impl Aggregate {
    pub fn add(&mut self, section: &ShotSection) {
        self.total_shots += section.quantity as u64;
        self.made_shots += section.total_made as u64;
    }
}
