//! Application settings
//!
//! Loads the renderer/bridge configuration (theme, pixel ratio, database
//! path, zone table, default filter) from config/shotchart.toml.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::constants::{CANCEL_POLL_ROWS, DEFAULT_DATABASE_PATH};
use crate::query::ShotFilter;
use crate::render::Theme;

/// Path to the settings file
pub const SETTINGS_FILE: &str = "config/shotchart.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Backing-store pixels per CSS pixel
    pub device_pixel_ratio: f64,
    /// Court width in CSS pixels for rendered images
    pub width: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
            width: 800.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Rows the worker reads between cancellation checks
    pub cancel_poll_rows: usize,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            cancel_poll_rows: CANCEL_POLL_ROWS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub database_path: String,
    /// JSON zone table; the built-in basic zones when unset
    pub zones_file: Option<String>,
    pub engine: EngineSettings,
    pub theme: Theme,
    pub bridge: BridgeSettings,
    pub filter: ShotFilter,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            zones_file: None,
            engine: EngineSettings::default(),
            theme: Theme::default(),
            bridge: BridgeSettings::default(),
            filter: ShotFilter::default(),
        }
    }
}

impl AppSettings {
    /// Strict load: any read or parse failure is an error
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load settings, or return defaults if the file is missing or invalid
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No {} found, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(settings) => {
                info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let content = toml::to_string_pretty(self)?;
        let io_err = |source: std::io::Error| SettingsError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, content).map_err(io_err)?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }

    pub fn zones_path(&self) -> Option<PathBuf> {
        self.zones_file.as_ref().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::GameResult;
    use crate::render::Color;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings::load(&dir.path().join("absent.toml"));
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.bridge.cancel_poll_rows, 5_000);
        assert_eq!(settings.database_path, "nba_db.sqlite3");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shotchart.toml");
        fs::write(
            &path,
            "zones_file = \"zones.json\"\n\n[engine]\ndevice_pixel_ratio = 2.0\n\n[theme]\nhighlight = \"#ff8800\"\n\n[filter]\nseason = 22\nresult = \"wins\"\n",
        )
        .unwrap();

        let settings = AppSettings::load_from(&path).unwrap();
        assert_eq!(settings.engine.device_pixel_ratio, 2.0);
        assert_eq!(settings.engine.width, 800.0);
        assert_eq!(settings.theme.highlight, Color::rgb(0xff, 0x88, 0x00));
        assert_eq!(settings.theme.line, Theme::default().line);
        assert_eq!(settings.filter.season, Some(22));
        assert_eq!(settings.filter.result, GameResult::Wins);
        assert_eq!(settings.zones_path(), Some(PathBuf::from("zones.json")));
    }

    #[test]
    fn test_invalid_color_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shotchart.toml");
        fs::write(&path, "[theme]\nline = \"grey\"\n").unwrap();

        assert!(matches!(AppSettings::load_from(&path), Err(SettingsError::Parse { .. })));
        // Lenient load falls back
        assert_eq!(AppSettings::load(&path), AppSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("shotchart.toml");
        let mut settings = AppSettings::default();
        settings.engine.width = 640.0;
        settings.theme.background = Color::rgb(1, 2, 3);

        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path).unwrap(), settings);
    }
}
