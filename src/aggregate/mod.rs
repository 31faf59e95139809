//! Spatial aggregation of shot records into the fixed court grid

mod section;
mod state;

pub use section::{Aggregate, GridKey, RawShot, ShotInput, ShotSection, bin_location};
pub use state::{AggregationState, LoadSummary};
