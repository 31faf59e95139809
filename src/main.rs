//! Shot chart renderer
//!
//! Queries the shots database through the worker bridge, loads the result
//! into a visualization engine and writes the court as a PNG. An optional
//! zone or cell range is highlighted and its aggregate printed as JSON.
//!
//! Usage:
//!   cargo run                                         # Whole table, config defaults
//!   cargo run -- --season 24 --out shots_24.png
//!   cargo run -- --team 1610612738 --result wins
//!   cargo run -- --player 201939 --zone "Above the Break 3"
//!   cargo run -- --range 20,0,30,8                    # Highlight a cell range
//!   cargo run -- --zones-file config/zones.json --zone paint
//!   cargo run -- --list-zones
//!   cargo run -- --db other.sqlite3 --width 1200 --ratio 2
//!   cargo run -- --debug-log

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;

use shotchart::engine::LayoutContainer;
use shotchart::{
    AppSettings, DbClient, DebugLogConfig, EngineCallbacks, EngineOptions, GameResult,
    RasterCanvas, SETTINGS_FILE, SelectionRange, VisualizationEngine, ZoneTable, shots_from_rows,
};
use tracing::{error, info};

const DEFAULT_OUTPUT: &str = "shotchart.png";

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Debug, Default)]
struct RenderConfig {
    config_path: Option<PathBuf>,
    database_path: Option<String>,
    zones_file: Option<String>,
    output: Option<PathBuf>,
    width: Option<f64>,
    pixel_ratio: Option<f64>,
    season: Option<u32>,
    teams: Vec<i64>,
    players: Vec<i64>,
    positions: Vec<String>,
    result: Option<GameResult>,
    zone: Option<String>,
    range: Option<SelectionRange>,
    list_zones: bool,
}

fn parse_args() -> Result<RenderConfig, String> {
    let mut config = RenderConfig::default();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config.config_path = Some(PathBuf::from(value(&arg, args.next())?)),
            "--db" => config.database_path = Some(value(&arg, args.next())?),
            "--zones-file" => config.zones_file = Some(value(&arg, args.next())?),
            "--out" => config.output = Some(PathBuf::from(value(&arg, args.next())?)),
            "--width" => config.width = Some(parse_number(&arg, args.next())?),
            "--ratio" => config.pixel_ratio = Some(parse_number(&arg, args.next())?),
            "--season" => config.season = Some(parse_number(&arg, args.next())?),
            "--team" => config.teams.push(parse_number(&arg, args.next())?),
            "--player" => config.players.push(parse_number(&arg, args.next())?),
            "--position" => config.positions.push(value(&arg, args.next())?.to_uppercase()),
            "--result" => config.result = Some(parse_result(&value(&arg, args.next())?)?),
            "--zone" => config.zone = Some(value(&arg, args.next())?),
            "--range" => config.range = Some(parse_range(&value(&arg, args.next())?)?),
            "--list-zones" => config.list_zones = true,
            // Consumed by DebugLogConfig
            "--debug-log" => {}
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }

    if config.zone.is_some() && config.range.is_some() {
        return Err("--zone and --range are mutually exclusive".to_string());
    }
    Ok(config)
}

fn value(flag: &str, next: Option<String>) -> Result<String, String> {
    next.ok_or_else(|| format!("{} expects a value", flag))
}

fn parse_number<T: std::str::FromStr>(flag: &str, next: Option<String>) -> Result<T, String> {
    let raw = value(flag, next)?;
    raw.parse()
        .map_err(|_| format!("{} expects a number, got '{}'", flag, raw))
}

fn parse_result(raw: &str) -> Result<GameResult, String> {
    match raw.to_lowercase().as_str() {
        "all" => Ok(GameResult::All),
        "wins" | "win" | "w" => Ok(GameResult::Wins),
        "losses" | "loss" | "l" => Ok(GameResult::Losses),
        _ => Err(format!("--result expects all, wins or losses, got '{}'", raw)),
    }
}

/// `x0,y0,x1,y1` in grid cells
fn parse_range(raw: &str) -> Result<SelectionRange, String> {
    let parts: Vec<i32> = raw
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("--range expects x0,y0,x1,y1, got '{}'", raw))?;
    match parts.as_slice() {
        &[start_x, start_y, end_x, end_y] => Ok(SelectionRange {
            start_x,
            start_y,
            end_x,
            end_y,
        }),
        _ => Err(format!("--range expects four values, got {}", parts.len())),
    }
}

// =============================================================================
// LAYOUT
// =============================================================================

/// Offline container with a fixed content box
struct FixedWidth {
    width: f64,
    pixel_ratio: f64,
}

impl LayoutContainer for FixedWidth {
    fn content_width(&self) -> f64 {
        self.width
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }
}

// =============================================================================
// MAIN
// =============================================================================

fn apply_overrides(settings: &mut AppSettings, config: &RenderConfig) {
    if let Some(path) = &config.database_path {
        settings.database_path = path.clone();
    }
    if let Some(path) = &config.zones_file {
        settings.zones_file = Some(path.clone());
    }
    if let Some(width) = config.width {
        settings.engine.width = width;
    }
    if let Some(ratio) = config.pixel_ratio {
        settings.engine.device_pixel_ratio = ratio;
    }
    if config.season.is_some() {
        settings.filter.season = config.season;
    }
    if !config.teams.is_empty() {
        settings.filter.teams = config.teams.clone();
    }
    if !config.players.is_empty() {
        settings.filter.players = config.players.clone();
    }
    if !config.positions.is_empty() {
        settings.filter.positions = config.positions.clone();
    }
    if let Some(result) = config.result {
        settings.filter.result = result;
    }
}

fn list_zones(zones: &ZoneTable) {
    println!("{} zones:", zones.len());
    for (id, cells) in zones.iter() {
        println!("  {:<24} {:>4} cells", id, cells.len());
    }
}

fn run(config: RenderConfig) -> Result<(), Box<dyn Error>> {
    let settings_path = config
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));
    let mut settings = AppSettings::load(&settings_path);
    apply_overrides(&mut settings, &config);

    let zones = ZoneTable::load_or_default(settings.zones_path().as_deref());
    if config.list_zones {
        list_zones(&zones);
        return Ok(());
    }
    if let Some(zone) = &config.zone
        && !zones.contains(zone)
    {
        return Err(format!("unknown zone '{}' (try --list-zones)", zone).into());
    }

    let client = DbClient::spawn(settings.bridge.cancel_poll_rows)?;
    let version = client.init(&settings.database_path)?;
    println!(
        "SQLite {} ({}), database {}",
        version.lib_version, version.lib_version_number, settings.database_path
    );

    let sql = settings.filter.aggregate_sql();
    let started = Instant::now();
    let rows = client.query(&sql)?;
    let shots = shots_from_rows(&rows)?;
    client.close()?;
    info!(rows = rows.len(), elapsed_ms = started.elapsed().as_millis() as u64, "Query complete");

    let mut canvas = RasterCanvas::new();
    let container = FixedWidth {
        width: settings.engine.width,
        pixel_ratio: settings.engine.device_pixel_ratio,
    };
    let callbacks = EngineCallbacks::new(|data, source| match data {
        Some(data) => match serde_json::to_string_pretty(&data) {
            Ok(json) => println!("Selection ({:?}):\n{}", source, json),
            Err(e) => error!("Failed to serialize selection: {}", e),
        },
        None => println!("Selection cleared ({:?})", source),
    });
    let options = EngineOptions {
        theme: settings.theme.clone(),
        zones,
    };
    let mut engine = VisualizationEngine::new(&mut canvas, container, callbacks, options)?;

    let summary = engine.set_shot_data(&shots);
    println!(
        "Loaded {} cells from {} rows ({} outside the court), busiest cell {} shots",
        summary.cells,
        rows.len(),
        summary.dropped,
        engine.shots().most_shots()
    );

    if let Some(zone) = &config.zone {
        engine.highlight_zone(Some(zone.as_str()));
    } else if let Some(range) = config.range {
        engine.set_hovered_shot(Some(range));
    }

    let output = config
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    save(&engine, &output)?;
    engine.destroy();
    Ok(())
}

fn save<C: LayoutContainer>(
    engine: &VisualizationEngine<shotchart::RasterSurface, C>,
    output: &Path,
) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    engine.surface().save_png(output)?;
    let (width, height) = engine.size().device_pixels();
    println!("Wrote {} ({}x{})", output.display(), width, height);
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    DebugLogConfig::load_with_args(&args).init_tracing();

    let config = match parse_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(config) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
