//! Named zones: fixed sets of grid cells used for region highlighting

mod database;

pub use database::{
    ABOVE_THE_BREAK_3, BACKCOURT, IN_THE_PAINT, LEFT_CORNER_3, MID_RANGE, RESTRICTED_AREA,
    RIGHT_CORNER_3, ZoneError, ZoneTable, cell_set, classify_basic_zone,
};
