//! Configuration loading.
//!
//! Settings live in `~/.occupancy/config.toml` (or `$OCCUPANCY_CONFIG`).
//! A missing file means defaults; a file that does not parse is an error.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OccupancyError, Result};
use crate::format::{DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT};
use crate::grid::{Orientation, MAX_WINDOW_DAYS};
use crate::sessions::RoundingRule;

const CONFIG_ENV: &str = "OCCUPANCY_CONFIG";
const DATA_DIR_NAME: &str = ".occupancy";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Period of the data refresh timer.
    pub refresh_secs: u64,
    /// Period of the clock tick that recomputes open sessions.
    pub tick_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            refresh_secs: 30,
            tick_secs: 1,
        }
    }
}

impl ScheduleConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub window_days: u32,
    pub orientation: Orientation,
    pub rounding: RoundingRule,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            orientation: Orientation::NewestFirst,
            rounding: RoundingRule::Floor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub time_format: String,
    pub date_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// Returns the occupancy data directory (~/.occupancy).
pub fn data_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(DATA_DIR_NAME))
        .ok_or(OccupancyError::HomeDirNotFound)
}

pub fn default_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    Ok(data_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads configuration from `path`, or the default location when `None`.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(path) => path,
        None => default_config_path()?,
    };

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs_err::read_to_string(&config_path).map_err(|source| OccupancyError::Io {
        context: format!("reading config {}", config_path.display()),
        source,
    })?;
    let config = toml::from_str::<Config>(&content).map_err(|err| {
        OccupancyError::ConfigMalformed {
            path: config_path.clone(),
            details: err.to_string(),
        }
    })?;

    if config.grid.window_days > MAX_WINDOW_DAYS {
        return Err(OccupancyError::ConfigMalformed {
            path: config_path,
            details: format!(
                "grid.window_days is {}, at most {} is allowed",
                config.grid.window_days, MAX_WINDOW_DAYS
            ),
        });
    }

    Ok(config)
}
