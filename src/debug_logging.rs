//! Debug logging configuration shared across binaries.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub const DEBUG_LOG_SETTINGS_FILE: &str = "config/debug_logging.json";

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV_VAR: &str = "SHOTCHART_LOG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugLogConfig {
    pub enabled: bool,
}

impl DebugLogConfig {
    pub fn load() -> Self {
        Self::load_from(Path::new(DEBUG_LOG_SETTINGS_FILE))
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn enabled_from_args(args: &[String]) -> bool {
        args.iter().any(|arg| arg == "--debug-log")
    }

    pub fn load_with_args(args: &[String]) -> Self {
        let mut config = Self::load();
        if Self::enabled_from_args(args) {
            config.enabled = true;
        }
        config
    }

    /// Filter used when `SHOTCHART_LOG` is unset
    pub fn default_directive(&self) -> &'static str {
        if self.enabled { "debug" } else { "info" }
    }

    /// Install the global fmt subscriber. A second call is a no-op.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }
}
