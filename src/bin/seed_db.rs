//! Synthetic shots database generator
//!
//! Writes a `shots` table with the columns the renderer queries, filled with
//! attempts clustered at the rim, in the paint and around the arc. Make
//! probability falls off with distance, with a bump for corner threes.
//!
//! Usage:
//!   cargo run --bin seed_db                          # 50k shots into nba_db.sqlite3
//!   cargo run --bin seed_db -- --shots 200000 --seasons 3
//!   cargo run --bin seed_db -- --db demo.sqlite3 --seed 7
//!   cargo run --bin seed_db -- --append

use std::error::Error;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::{Connection, params};
use shotchart::aggregate::bin_location;
use shotchart::constants::{
    BASKET_DISTANCE_TO_BACKLINE, DEFAULT_DATABASE_PATH, THREE_POINT_LINE_RADIUS,
};
use shotchart::query::POSITIONS;
use shotchart::zones::{LEFT_CORNER_3, RIGHT_CORNER_3, classify_basic_zone};

const TEAM_ID_BASE: i64 = 1_610_612_737;
const TEAM_COUNT: i64 = 30;
const PLAYERS_PER_TEAM: i64 = 15;
const FIRST_SEASON: u32 = 24;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS shots (
    loc_x REAL NOT NULL,
    loc_y REAL NOT NULL,
    shot_made INTEGER NOT NULL,
    season INTEGER NOT NULL,
    team_id INTEGER NOT NULL,
    player_id INTEGER NOT NULL,
    position TEXT NOT NULL,
    game_won INTEGER NOT NULL,
    def_rtg_rank INTEGER NOT NULL,
    off_rtg_rank INTEGER NOT NULL,
    basic_zone TEXT NOT NULL
)";

// =============================================================================
// ARGUMENTS
// =============================================================================

struct SeedConfig {
    database_path: String,
    shots: u64,
    seasons: u32,
    seed: Option<u64>,
    append: bool,
}

fn parse_args() -> Result<SeedConfig, String> {
    let mut config = SeedConfig {
        database_path: DEFAULT_DATABASE_PATH.to_string(),
        shots: 50_000,
        seasons: 1,
        seed: None,
        append: false,
    };
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                config.database_path = args.next().ok_or("--db expects a path")?;
            }
            "--shots" => config.shots = number(&arg, args.next())?,
            "--seasons" => config.seasons = number::<u32>(&arg, args.next())?.clamp(1, FIRST_SEASON),
            "--seed" => config.seed = Some(number(&arg, args.next())?),
            "--append" => config.append = true,
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }
    Ok(config)
}

fn number<T: std::str::FromStr>(flag: &str, next: Option<String>) -> Result<T, String> {
    let raw = next.ok_or_else(|| format!("{} expects a value", flag))?;
    raw.parse()
        .map_err(|_| format!("{} expects a number, got '{}'", flag, raw))
}

// =============================================================================
// SHOT MODEL
// =============================================================================

struct Shot {
    loc_x: f64,
    loc_y: f64,
    made: bool,
    zone: &'static str,
}

/// Distance from the basket in feet, sampled from rough league frequencies
fn sample_distance(rng: &mut impl Rng) -> f64 {
    let roll: f64 = rng.r#gen();
    if roll < 0.30 {
        rng.gen_range(0.0..4.0)
    } else if roll < 0.45 {
        rng.gen_range(4.0..14.0)
    } else if roll < 0.60 {
        rng.gen_range(14.0..THREE_POINT_LINE_RADIUS)
    } else if roll < 0.995 {
        rng.gen_range(THREE_POINT_LINE_RADIUS..THREE_POINT_LINE_RADIUS + 3.0)
    } else {
        rng.gen_range(30.0..45.0)
    }
}

fn make_probability(distance: f64, zone: &str) -> f64 {
    let base = if distance < 4.0 {
        0.65
    } else {
        (0.48 - (distance - 4.0) * 0.006).max(0.05)
    };
    if zone == LEFT_CORNER_3 || zone == RIGHT_CORNER_3 {
        base + 0.04
    } else {
        base
    }
}

fn sample_shot(rng: &mut impl Rng) -> Option<Shot> {
    let distance = sample_distance(rng);
    // Angle measured from the baseline toward center court
    let angle = rng.gen_range(0.0..std::f64::consts::PI);
    let loc_x = distance * angle.cos();
    let loc_y = BASKET_DISTANCE_TO_BACKLINE + distance * angle.sin();

    let cell = bin_location(loc_x, loc_y)?;
    let zone = classify_basic_zone(cell);
    let made = rng.gen_bool(make_probability(distance, zone).clamp(0.0, 1.0));
    Some(Shot {
        loc_x,
        loc_y,
        made,
        zone,
    })
}

// =============================================================================
// MAIN
// =============================================================================

fn seed(config: &SeedConfig) -> Result<u64, Box<dyn Error>> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut conn = Connection::open(&config.database_path)?;
    if !config.append {
        conn.execute("DROP TABLE IF EXISTS shots", [])?;
    }
    conn.execute(CREATE_TABLE, [])?;

    let tx = conn.transaction()?;
    let mut written = 0u64;
    {
        let mut insert = tx.prepare(
            "INSERT INTO shots (loc_x, loc_y, shot_made, season, team_id, player_id, position, \
             game_won, def_rtg_rank, off_rtg_rank, basic_zone) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        while written < config.shots {
            // Rare samples past the visible court are redrawn
            let Some(shot) = sample_shot(&mut rng) else {
                continue;
            };
            let team = rng.gen_range(0..TEAM_COUNT);
            let slot = rng.gen_range(0..PLAYERS_PER_TEAM);
            let season = FIRST_SEASON - rng.gen_range(0..config.seasons);
            insert.execute(params![
                shot.loc_x,
                shot.loc_y,
                shot.made as i64,
                season,
                TEAM_ID_BASE + team,
                (team + 1) * 1_000 + slot,
                POSITIONS[slot as usize % POSITIONS.len()],
                rng.gen_bool(0.5) as i64,
                rng.gen_range(1..=30),
                rng.gen_range(1..=30),
                shot.zone,
            ])?;
            written += 1;
        }
    }
    tx.commit()?;
    Ok(written)
}

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    println!(
        "Seeding {} shots over {} season(s) into {}",
        config.shots, config.seasons, config.database_path
    );
    let started = Instant::now();
    match seed(&config) {
        Ok(written) => println!(
            "Wrote {} shots in {:.2}s",
            written,
            started.elapsed().as_secs_f64()
        ),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
