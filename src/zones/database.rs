//! Zone table - loading, storage, and the geometric default table

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::constants::{
    BASKET_DISTANCE_TO_BACKLINE, GRID_SIZE, PAINTED_AREA_LENGTH, PAINTED_AREA_WIDTH,
    RESTRICTED_CIRCLE_RADIUS, THREE_POINT_LINE_DISTANCE, THREE_POINT_LINE_RADIUS,
    THREE_POINT_LINE_STRAIGHT_LENGTH,
};
use crate::coords::GridCell;

pub const RESTRICTED_AREA: &str = "Restricted Area";
pub const IN_THE_PAINT: &str = "In The Paint (Non-RA)";
pub const MID_RANGE: &str = "Mid-Range";
pub const LEFT_CORNER_3: &str = "Left Corner 3";
pub const RIGHT_CORNER_3: &str = "Right Corner 3";
pub const ABOVE_THE_BREAK_3: &str = "Above the Break 3";
pub const BACKCOURT: &str = "Backcourt";

/// Depth (feet from the baseline) past which a shot is a backcourt heave
const BACKCOURT_DEPTH: f64 = 47.0;

#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("failed to read zone table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse zone table {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Static mapping from zone id to its member cells.
///
/// Treated as immutable configuration once handed to the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneTable {
    zones: BTreeMap<String, Vec<GridCell>>,
}

impl ZoneTable {
    pub fn new(zones: BTreeMap<String, Vec<GridCell>>) -> Self {
        Self { zones }
    }

    /// Load a JSON table of the form `{ "<zone id>": [{"x": 0, "y": 0}, ...] }`
    pub fn load(path: &Path) -> Result<Self, ZoneError> {
        let content = fs::read_to_string(path).map_err(|source| ZoneError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let zones = serde_json::from_str(&content).map_err(|source| ZoneError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { zones })
    }

    /// Load from file, or fall back to the basic zones when absent or invalid
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::basic_zones();
        };
        if !path.exists() {
            info!("Zone table {} not found, using basic zones", path.display());
            return Self::basic_zones();
        }
        match Self::load(path) {
            Ok(table) => {
                info!("Loaded {} zones from {}", table.len(), path.display());
                table
            }
            Err(e) => {
                warn!("{}, using basic zones", e);
                Self::basic_zones()
            }
        }
    }

    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.zones)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)
    }

    pub fn get(&self, id: &str) -> Option<&[GridCell]> {
        self.zones.get(id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.zones.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.zones.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[GridCell])> {
        self.zones.iter().map(|(id, cells)| (id.as_str(), cells.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// NBA basic shot zones, assigned by the geometry of each cell's center
    pub fn basic_zones() -> Self {
        let mut zones: BTreeMap<String, Vec<GridCell>> = BTreeMap::new();
        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                let cell = GridCell::new(x, y);
                zones
                    .entry(classify_basic_zone(cell).to_string())
                    .or_default()
                    .push(cell);
            }
        }
        Self { zones }
    }
}

/// Basic zone for a cell, with feet measured from the left sideline (x) and
/// the baseline (y).
pub fn classify_basic_zone(cell: GridCell) -> &'static str {
    let center_x = cell.x as f64 + 0.5;
    let center_y = cell.y as f64 + 0.5;
    let half_width = GRID_SIZE as f64 / 2.0;

    let dx = center_x - half_width;
    let dy = center_y - BASKET_DISTANCE_TO_BACKLINE;
    let distance = (dx * dx + dy * dy).sqrt();

    if center_y > BACKCOURT_DEPTH {
        return BACKCOURT;
    }
    if distance <= RESTRICTED_CIRCLE_RADIUS {
        return RESTRICTED_AREA;
    }
    if dx.abs() <= PAINTED_AREA_WIDTH / 2.0 && center_y <= PAINTED_AREA_LENGTH {
        return IN_THE_PAINT;
    }

    let corner_x = half_width - THREE_POINT_LINE_DISTANCE;
    if center_y <= THREE_POINT_LINE_STRAIGHT_LENGTH {
        if dx <= -corner_x {
            return LEFT_CORNER_3;
        }
        if dx >= corner_x {
            return RIGHT_CORNER_3;
        }
        return MID_RANGE;
    }
    if distance > THREE_POINT_LINE_RADIUS {
        return ABOVE_THE_BREAK_3;
    }
    MID_RANGE
}

/// Membership set for neighbor tests
pub fn cell_set(cells: &[GridCell]) -> HashSet<GridCell> {
    cells.iter().copied().collect()
}
