//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/vidpulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/vidpulse/` (~/.config/vidpulse/)
//! - Data: `$XDG_DATA_HOME/vidpulse/` (~/.local/share/vidpulse/)
//! - State/Logs: `$XDG_STATE_HOME/vidpulse/` (~/.local/state/vidpulse/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Aggregation engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Database location override
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Aggregation engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Highest valid creator handle; handles are 1..=max
    #[serde(default = "default_max_creator_handle")]
    pub max_creator_handle: i64,

    /// Number of creators on the leaderboard
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,

    /// Result cache tuning
    #[serde(default)]
    pub cache: CacheConfig,

    /// Data-availability window months
    #[serde(default)]
    pub windows: WindowConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_creator_handle: default_max_creator_handle(),
            leaderboard_size: default_leaderboard_size(),
            cache: CacheConfig::default(),
            windows: WindowConfig::default(),
        }
    }
}

fn default_max_creator_handle() -> i64 {
    19
}

fn default_leaderboard_size() -> usize {
    5
}

/// Result cache tuning
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached results
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Entry time-to-live in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_capacity() -> usize {
    100
}

fn default_cache_ttl_secs() -> u64 {
    300
}

/// The two fixed per-year data-availability windows, as month ranges.
///
/// Defaults match the platform's published ranges: videos are created
/// August through October, counters are sampled November through December.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_creation_start_month")]
    pub creation_start_month: u32,

    #[serde(default = "default_creation_end_month")]
    pub creation_end_month: u32,

    #[serde(default = "default_counter_start_month")]
    pub counter_start_month: u32,

    #[serde(default = "default_counter_end_month")]
    pub counter_end_month: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            creation_start_month: default_creation_start_month(),
            creation_end_month: default_creation_end_month(),
            counter_start_month: default_counter_start_month(),
            counter_end_month: default_counter_end_month(),
        }
    }
}

impl WindowConfig {
    /// Validate month values and ordering. The windows must be disjoint,
    /// with the creation window strictly before the counter window.
    pub fn validate(&self) -> Result<()> {
        let months = [
            self.creation_start_month,
            self.creation_end_month,
            self.counter_start_month,
            self.counter_end_month,
        ];
        if months.iter().any(|&m| !(1..=12).contains(&m)) {
            return Err(Error::Config(format!(
                "window months must be between 1 and 12, got {:?}",
                months
            )));
        }
        if self.creation_start_month > self.creation_end_month
            || self.counter_start_month > self.counter_end_month
        {
            return Err(Error::Config(
                "window start month must not be after its end month".to_string(),
            ));
        }
        if self.creation_end_month >= self.counter_start_month {
            return Err(Error::Config(
                "creation window must end before the counter window starts".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_creation_start_month() -> u32 {
    8
}

fn default_creation_end_month() -> u32 {
    10
}

fn default_counter_start_month() -> u32 {
    11
}

fn default_counter_end_month() -> u32 {
    12
}

/// Database location override
#[derive(Debug, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Override path for the SQLite database file
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.engine.windows.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/vidpulse/config.toml` (~/.config/vidpulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("vidpulse").join("config.toml")
    }

    /// Returns the data directory path (for the SQLite database)
    ///
    /// `$XDG_DATA_HOME/vidpulse/` (~/.local/share/vidpulse/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("vidpulse")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/vidpulse/` (~/.local/state/vidpulse/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("vidpulse")
    }

    /// Returns the database file path, honoring the configured override
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("data.db"))
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/vidpulse/vidpulse.log` (~/.local/state/vidpulse/vidpulse.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("vidpulse.log")
    }
}
