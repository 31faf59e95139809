//! Grid-keyed shot aggregation

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

use super::section::{Aggregate, GridKey, RawShot, ShotInput, ShotSection, bin_location};
use crate::coords::{GridCell, clip_to_grid};

/// Outcome of loading a batch of shots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadSummary {
    /// Cells stored after the load
    pub cells: usize,
    /// Entries that binned outside the grid
    pub dropped: usize,
}

/// Per-cell shot totals plus the largest cell quantity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationState {
    sections: HashMap<GridKey, ShotSection>,
    most_shots: u32,
}

impl AggregationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all cells with pre-aggregated input.
    ///
    /// Two entries that bin to the same cell overwrite; the last one wins.
    pub fn set_shot_data(&mut self, shots: &[ShotInput]) -> LoadSummary {
        self.sections.clear();
        let mut dropped = 0;

        for shot in shots {
            let Some(cell) = bin_location(shot.loc_x, shot.loc_y) else {
                dropped += 1;
                continue;
            };
            let Some(key) = GridKey::from_cell(cell) else {
                dropped += 1;
                continue;
            };
            let missed = shot.total_shots.saturating_sub(shot.total_made);
            self.sections
                .insert(key, ShotSection::new(cell, shot.total_made, missed));
        }

        self.refresh_most_shots();
        let summary = LoadSummary {
            cells: self.sections.len(),
            dropped,
        };
        debug!(
            cells = summary.cells,
            dropped = summary.dropped,
            most_shots = self.most_shots,
            "Loaded shot data"
        );
        summary
    }

    /// Bin individual shots and add them to the existing cells in place.
    pub fn accumulate(&mut self, shots: &[RawShot]) -> LoadSummary {
        let (counts, dropped) = shots
            .par_iter()
            .fold(
                || (HashMap::<GridKey, (u32, u32)>::new(), 0usize),
                |(mut counts, mut dropped), shot| {
                    match bin_location(shot.loc_x, shot.loc_y).and_then(GridKey::from_cell) {
                        Some(key) => {
                            let entry = counts.entry(key).or_insert((0, 0));
                            if shot.shot_made {
                                entry.0 += 1;
                            } else {
                                entry.1 += 1;
                            }
                        }
                        None => dropped += 1,
                    }
                    (counts, dropped)
                },
            )
            .reduce(
                || (HashMap::new(), 0),
                |(mut a, dropped_a), (b, dropped_b)| {
                    for (key, (made, missed)) in b {
                        let entry = a.entry(key).or_insert((0, 0));
                        entry.0 += made;
                        entry.1 += missed;
                    }
                    (a, dropped_a + dropped_b)
                },
            );

        for (key, (made, missed)) in counts {
            let section = self
                .sections
                .entry(key)
                .or_insert_with(|| ShotSection::new(key.cell(), 0, 0));
            section.total_made = section.total_made.saturating_add(made);
            section.total_missed = section.total_missed.saturating_add(missed);
            section.recompute();
        }

        self.refresh_most_shots();
        let summary = LoadSummary {
            cells: self.sections.len(),
            dropped,
        };
        debug!(
            shots = shots.len(),
            cells = summary.cells,
            dropped = summary.dropped,
            "Accumulated raw shots"
        );
        summary
    }

    pub fn clear(&mut self) {
        self.sections.clear();
        self.most_shots = 0;
    }

    fn refresh_most_shots(&mut self) {
        self.most_shots = self
            .sections
            .values()
            .map(|s| s.quantity)
            .max()
            .unwrap_or(0);
    }

    /// Largest quantity over all cells, 0 when empty
    pub fn most_shots(&self) -> u32 {
        self.most_shots
    }

    pub fn get(&self, cell: GridCell) -> Option<&ShotSection> {
        GridKey::from_cell(cell).and_then(|key| self.sections.get(&key))
    }

    pub fn sections(&self) -> impl Iterator<Item = &ShotSection> {
        self.sections.values()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sum over the closed rectangle spanned by two corners, in any order.
    /// Only the part on the grid is visited.
    pub fn aggregate_range(&self, start: GridCell, end: GridCell) -> Aggregate {
        let mut aggregate = Aggregate::default();
        let Some((min, max)) = clip_to_grid(start, end) else {
            return aggregate;
        };
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                if let Some(section) = self.get(GridCell::new(x, y)) {
                    aggregate.add(section);
                }
            }
        }
        aggregate
    }

    /// Sum over an explicit cell list. Missing cells contribute nothing.
    pub fn aggregate_cells<'a>(&self, cells: impl IntoIterator<Item = &'a GridCell>) -> Aggregate {
        let mut aggregate = Aggregate::default();
        for cell in cells {
            if let Some(section) = self.get(*cell) {
                aggregate.add(section);
            }
        }
        aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(loc_x: f64, loc_y: f64, total_shots: u32, total_made: u32) -> ShotInput {
        ShotInput {
            loc_x,
            loc_y,
            total_shots,
            total_made,
        }
    }

    /// (0,0) -> 3/4 made, (1,0) -> 0/5 made
    fn two_cells() -> AggregationState {
        let mut state = AggregationState::new();
        state.set_shot_data(&[input(-25.0, 0.0, 4, 3), input(-24.0, 0.0, 5, 0)]);
        state
    }

    #[test]
    fn test_two_cell_scenario() {
        let state = two_cells();
        assert_eq!(state.most_shots(), 5);

        let aggregate = state.aggregate_range(GridCell::new(0, 0), GridCell::new(1, 0));
        assert_eq!(aggregate.total_shots, 9);
        assert_eq!(aggregate.made_shots, 3);
    }

    #[test]
    fn test_every_cell_holds_invariant() {
        let mut state = AggregationState::new();
        state.set_shot_data(&[
            input(-20.0, 3.0, 10, 4),
            input(0.0, 0.0, 120, 80),
            input(12.0, 22.0, 7, 0),
            input(5.0, 30.0, 3, 5), // more made than attempted
        ]);

        for section in state.sections() {
            assert_eq!(section.quantity, section.total_made + section.total_missed);
            if section.quantity > 0 {
                assert_eq!(
                    section.field_goal_percentage,
                    section.total_made as f64 / section.quantity as f64
                );
            }
        }

        let max = state.sections().map(|s| s.quantity).max().unwrap();
        assert_eq!(state.most_shots(), max);
    }

    #[test]
    fn test_set_shot_data_is_idempotent() {
        // Includes an empty cell, whose percentage is NaN
        let data = [input(-3.0, 4.0, 10, 5), input(7.0, 9.0, 2, 1), input(0.0, 0.0, 0, 0)];
        let mut once = AggregationState::new();
        once.set_shot_data(&data);

        let mut twice = AggregationState::new();
        twice.set_shot_data(&data);
        twice.set_shot_data(&data);

        assert_eq!(once, twice);
        assert!(once.get(GridCell::new(25, 0)).unwrap().field_goal_percentage.is_nan());
    }

    #[test]
    fn test_set_shot_data_replaces_previous_dataset() {
        let mut state = two_cells();
        state.set_shot_data(&[input(10.0, 10.0, 2, 1)]);
        assert_eq!(state.len(), 1);
        assert!(state.get(GridCell::new(0, 0)).is_none());
        assert_eq!(state.most_shots(), 2);
    }

    #[test]
    fn test_empty_dataset() {
        let mut state = two_cells();
        let summary = state.set_shot_data(&[]);
        assert_eq!(summary.cells, 0);
        assert_eq!(state.most_shots(), 0);
        assert!(state.get(GridCell::new(0, 0)).is_none());
        assert!(state.get(GridCell::new(-4, 99)).is_none());

        let aggregate = state.aggregate_range(GridCell::new(0, 0), GridCell::new(49, 49));
        assert_eq!(aggregate, Aggregate::default());
    }

    #[test]
    fn test_out_of_grid_entries_are_dropped() {
        let mut state = AggregationState::new();
        // x = 50 would alias (0, 1) under a naive key
        let summary = state.set_shot_data(&[input(25.0, 0.0, 9, 9), input(-25.0, 1.0, 1, 0)]);
        assert_eq!(summary.dropped, 1);
        assert_eq!(state.len(), 1);
        assert_eq!(state.get(GridCell::new(0, 1)).unwrap().quantity, 1);
    }

    #[test]
    fn test_range_aggregate_counts_only_cells_inside() {
        let mut state = AggregationState::new();
        state.set_shot_data(&[
            input(-25.0, 0.0, 1, 1),  // (0,0)
            input(-24.0, 1.0, 2, 1),  // (1,1)
            input(-23.0, 2.0, 4, 2),  // (2,2)
            input(-22.0, 0.0, 8, 3),  // (3,0)
        ]);

        let aggregate = state.aggregate_range(GridCell::new(2, 2), GridCell::new(0, 0));
        assert_eq!(aggregate.total_shots, 7);
        assert_eq!(aggregate.made_shots, 4);

        let single = state.aggregate_range(GridCell::new(3, 0), GridCell::new(3, 0));
        assert_eq!(single.total_shots, 8);
    }

    #[test]
    fn test_range_aggregate_clips_to_grid() {
        let mut state = AggregationState::new();
        state.set_shot_data(&[input(-25.0, 0.0, 4, 3), input(24.0, 49.0, 6, 2)]);

        // Corners far outside the grid still sum only the 50x50 cells
        let huge = state.aggregate_range(
            GridCell::new(i32::MIN, i32::MIN),
            GridCell::new(i32::MAX, i32::MAX),
        );
        assert_eq!(huge.total_shots, 10);
        assert_eq!(huge.made_shots, 5);

        let partial = state.aggregate_range(GridCell::new(-5, -5), GridCell::new(0, 0));
        assert_eq!(partial.total_shots, 4);

        let outside = state.aggregate_range(GridCell::new(60, 60), GridCell::new(5000, 5000));
        assert_eq!(outside, Aggregate::default());
    }

    #[test]
    fn test_aggregate_cells_ignores_missing() {
        let mut state = AggregationState::new();
        state.set_shot_data(&[input(-25.0, 0.0, 10, 4), input(-24.0, 0.0, 20, 5)]);

        let zone = [
            GridCell::new(0, 0),
            GridCell::new(1, 0),
            GridCell::new(2, 0),
            GridCell::new(3, 0),
        ];
        let aggregate = state.aggregate_cells(&zone);
        assert_eq!(aggregate.total_shots, 30);
        assert_eq!(aggregate.made_shots, 9);
    }

    #[test]
    fn test_accumulate_raw_shots() {
        let mut state = AggregationState::new();
        let shots: Vec<RawShot> = (0..1000)
            .map(|i| RawShot {
                loc_x: if i % 2 == 0 { -25.0 } else { 0.0 },
                loc_y: 0.5,
                shot_made: i % 4 == 0,
            })
            .chain(std::iter::once(RawShot {
                loc_x: 40.0,
                loc_y: 0.0,
                shot_made: true,
            }))
            .collect();

        let summary = state.accumulate(&shots);
        assert_eq!(summary.dropped, 1);
        assert_eq!(summary.cells, 2);

        let left = state.get(GridCell::new(0, 0)).unwrap();
        assert_eq!(left.quantity, 500);
        assert_eq!(left.total_made, 250);
        let center = state.get(GridCell::new(25, 0)).unwrap();
        assert_eq!(center.total_made, 0);
        assert_eq!(state.most_shots(), 500);

        // Accumulating again adds in place
        state.accumulate(&shots[..2]);
        assert_eq!(state.get(GridCell::new(0, 0)).unwrap().quantity, 501);
        assert_eq!(state.most_shots(), 501);
    }
}
