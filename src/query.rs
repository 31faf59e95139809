//! Shot filters rendered to SQL, and bridge rows decoded back into shots
//!
//! Queries target a `shots` table with one row per attempt (`loc_x`, `loc_y`
//! in feet, `shot_made` 0/1, plus season/team/player/position/zone and the
//! opponent/own rating ranks).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::aggregate::{RawShot, ShotInput};
use crate::bridge::Row;

/// Full range of league rating ranks
pub const RANK_RANGE: (u32, u32) = (1, 30);

pub const POSITIONS: [&str; 5] = ["PG", "SG", "SF", "PF", "C"];

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("row is missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("column '{column}' has non-numeric value {value}")]
    InvalidValue { column: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    #[default]
    All,
    Wins,
    Losses,
}

/// Which shots to load onto the court
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShotFilter {
    pub season: Option<u32>,
    pub teams: Vec<i64>,
    pub players: Vec<i64>,
    pub positions: Vec<String>,
    pub result: GameResult,
    /// Opponent defensive rating rank, inclusive
    pub defensive_rating_rank: (u32, u32),
    /// Own offensive rating rank, inclusive
    pub offensive_rating_rank: (u32, u32),
    pub basic_zone: Option<String>,
}

impl Default for ShotFilter {
    fn default() -> Self {
        Self {
            season: None,
            teams: Vec::new(),
            players: Vec::new(),
            positions: Vec::new(),
            result: GameResult::All,
            defensive_rating_rank: RANK_RANGE,
            offensive_rating_rank: RANK_RANGE,
            basic_zone: None,
        }
    }
}

impl ShotFilter {
    /// `WHERE ...` for the active filters, empty when nothing filters
    pub fn where_clause(&self) -> String {
        let mut clauses = Vec::new();

        if let Some(season) = self.season {
            clauses.push(format!("season = {}", season));
        }
        if !self.teams.is_empty() {
            clauses.push(format!("team_id IN ({})", join_numbers(&self.teams)));
        }
        if !self.players.is_empty() {
            clauses.push(format!("player_id IN ({})", join_numbers(&self.players)));
        }
        if !self.positions.is_empty() {
            let quoted: Vec<String> = self.positions.iter().map(|p| quote(p)).collect();
            clauses.push(format!("position IN ({})", quoted.join(", ")));
        }
        match self.result {
            GameResult::All => {}
            GameResult::Wins => clauses.push("game_won = 1".to_string()),
            GameResult::Losses => clauses.push("game_won = 0".to_string()),
        }
        if let Some(clause) = rank_clause("def_rtg_rank", self.defensive_rating_rank) {
            clauses.push(clause);
        }
        if let Some(clause) = rank_clause("off_rtg_rank", self.offensive_rating_rank) {
            clauses.push(clause);
        }
        if let Some(zone) = &self.basic_zone {
            clauses.push(format!("basic_zone = {}", quote(zone)));
        }

        if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        }
    }

    /// One row per whole-foot location with attempt and make counts.
    /// Locations floor the same way [`crate::aggregate::bin_location`] does.
    pub fn aggregate_sql(&self) -> String {
        format!(
            "SELECT {} - 25 AS locX, {} AS locY, \
             COUNT(*) AS totalShots, SUM(shot_made) AS totalMade FROM shots{} \
             GROUP BY locX, locY",
            floor_sql("loc_x + 25"),
            floor_sql("loc_y"),
            self.where_clause()
        )
    }

    /// Individual attempts, optionally capped
    pub fn raw_sql(&self, limit: Option<u64>) -> String {
        let mut sql = format!(
            "SELECT loc_x AS locX, loc_y AS locY, shot_made AS shotMade FROM shots{}",
            self.where_clause()
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        sql
    }
}

/// `floor(expr)` without relying on SQLite's optional math functions.
/// `CAST` truncates toward zero, so negative fractions step down by one.
fn floor_sql(expr: &str) -> String {
    format!(
        "(CAST({e} AS INTEGER) - ({e} < CAST({e} AS INTEGER)))",
        e = expr
    )
}

fn join_numbers(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// SQL string literal with embedded quotes doubled
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn rank_clause(column: &str, (a, b): (u32, u32)) -> Option<String> {
    let (low, high) = (a.min(b), a.max(b));
    if low <= RANK_RANGE.0 && high >= RANK_RANGE.1 {
        return None;
    }
    Some(format!("{} BETWEEN {} AND {}", column, low, high))
}

fn number(row: &Row, column: &'static str) -> Result<f64, QueryError> {
    match row.get(column) {
        None => Err(QueryError::MissingColumn(column)),
        // SUM over zero rows
        Some(Value::Null) => Ok(0.0),
        Some(value) => value.as_f64().ok_or_else(|| QueryError::InvalidValue {
            column,
            value: value.to_string(),
        }),
    }
}

fn count(row: &Row, column: &'static str) -> Result<u32, QueryError> {
    let value = number(row, column)?;
    if value < 0.0 || !value.is_finite() {
        return Err(QueryError::InvalidValue {
            column,
            value: value.to_string(),
        });
    }
    Ok(value.min(u32::MAX as f64) as u32)
}

/// Decode rows from [`ShotFilter::aggregate_sql`]
pub fn shots_from_rows(rows: &[Row]) -> Result<Vec<ShotInput>, QueryError> {
    rows.iter()
        .map(|row| {
            Ok(ShotInput {
                loc_x: number(row, "locX")?,
                loc_y: number(row, "locY")?,
                total_shots: count(row, "totalShots")?,
                total_made: count(row, "totalMade")?,
            })
        })
        .collect()
}

/// Decode rows from [`ShotFilter::raw_sql`]
pub fn raw_shots_from_rows(rows: &[Row]) -> Result<Vec<RawShot>, QueryError> {
    rows.iter()
        .map(|row| {
            Ok(RawShot {
                loc_x: number(row, "locX")?,
                loc_y: number(row, "locY")?,
                shot_made: number(row, "shotMade")? != 0.0,
            })
        })
        .collect()
}
