use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

/// Timing and tolerance tunables for the per-video tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Accrual/poll tick cadence in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Progress emission cadence in milliseconds. Coarser than the tick to
    /// bound write volume.
    #[serde(default = "default_emit_interval_ms")]
    pub emit_interval_ms: u64,

    /// Seconds of slack before a seek counts as skipping ahead.
    #[serde(default = "default_seek_tolerance")]
    pub seek_tolerance_seconds: f64,

    /// Tick deltas at or above this are discarded, not clamped. Guards
    /// against tab-sleep/suspend producing huge watched-time jumps.
    #[serde(default = "default_max_plausible_delta")]
    pub max_plausible_delta_seconds: f64,

    /// Ratio of max-reached to duration at which a video counts as watched.
    #[serde(default = "default_completion_ratio")]
    pub completion_ratio: f64,

    /// Cadence for polling external widget script readiness.
    #[serde(default = "default_script_check_interval_ms")]
    pub script_check_interval_ms: u64,

    /// Readiness checks before the widget script load is declared failed.
    #[serde(default = "default_script_max_checks")]
    pub script_max_checks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the enrollment store.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Minimum seconds between enrollment refresh suggestions after writes.
    #[serde(default = "default_refresh_window")]
    pub refresh_window_seconds: u64,

    /// Upper bound on the single best-effort write at page unload.
    #[serde(default = "default_unload_flush_timeout_ms")]
    pub unload_flush_timeout_ms: u64,
}

impl TrackerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn emit_interval(&self) -> Duration {
        Duration::from_millis(self.emit_interval_ms)
    }

    pub fn script_check_interval(&self) -> Duration {
        Duration::from_millis(self.script_check_interval_ms)
    }
}

impl SyncConfig {
    pub fn refresh_window(&self) -> Duration {
        Duration::from_secs(self.refresh_window_seconds)
    }

    pub fn unload_flush_timeout(&self) -> Duration {
        Duration::from_millis(self.unload_flush_timeout_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            debug!("Loading config from {:?}", config_path);
            let contents =
                fs::read_to_string(config_path).context("Failed to read config file")?;
            let config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            info!("Config loaded successfully");
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", config_path);
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("atril").join("config.toml"))
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            emit_interval_ms: default_emit_interval_ms(),
            seek_tolerance_seconds: default_seek_tolerance(),
            max_plausible_delta_seconds: default_max_plausible_delta(),
            completion_ratio: default_completion_ratio(),
            script_check_interval_ms: default_script_check_interval_ms(),
            script_max_checks: default_script_max_checks(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            refresh_window_seconds: default_refresh_window(),
            unload_flush_timeout_ms: default_unload_flush_timeout_ms(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_emit_interval_ms() -> u64 {
    10_000
}

fn default_seek_tolerance() -> f64 {
    2.0
}

fn default_max_plausible_delta() -> f64 {
    3.0
}

fn default_completion_ratio() -> f64 {
    0.95
}

fn default_script_check_interval_ms() -> u64 {
    100
}

fn default_script_max_checks() -> u32 {
    300
}

fn default_base_url() -> String {
    "http://localhost:3001/api".to_string()
}

fn default_refresh_window() -> u64 {
    30
}

fn default_unload_flush_timeout_ms() -> u64 {
    2_000
}
