use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub progress: ProgressConfig,

    #[serde(default)]
    pub controls: ControlsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_volume")]
    pub default_volume: f64,

    #[serde(default)]
    pub autoplay: bool,

    #[serde(default = "default_true")]
    pub auto_advance: bool,

    /// Seconds to wait after an episode ends before navigating to the next one.
    #[serde(default = "default_auto_advance_delay")]
    pub auto_advance_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Minimum time between two scheduled persistence writes.
    #[serde(default = "default_save_interval")]
    pub save_interval_ms: u64,

    /// Position delta that forces a write even inside the interval window.
    #[serde(default = "default_min_delta")]
    pub min_delta_seconds: f64,

    /// Percentage of duration beyond which content counts as finished.
    #[serde(default = "default_completion_threshold")]
    pub completion_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlsConfig {
    #[serde(default = "default_hide_delay")]
    pub hide_delay_secs: u64,
}

impl PlaybackConfig {
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_secs(self.auto_advance_delay_secs)
    }
}

impl ProgressConfig {
    pub fn save_interval(&self) -> Duration {
        Duration::from_millis(self.save_interval_ms)
    }
}

impl ControlsConfig {
    pub fn hide_delay(&self) -> Duration {
        Duration::from_secs(self.hide_delay_secs)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
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
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
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
        Ok(config_dir.join("playhead").join("config.toml"))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            autoplay: false,
            auto_advance: default_true(),
            auto_advance_delay_secs: default_auto_advance_delay(),
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            save_interval_ms: default_save_interval(),
            min_delta_seconds: default_min_delta(),
            completion_threshold: default_completion_threshold(),
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            hide_delay_secs: default_hide_delay(),
        }
    }
}

fn default_volume() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_auto_advance_delay() -> u64 {
    3
}

fn default_save_interval() -> u64 {
    10_000
}

fn default_min_delta() -> f64 {
    5.0
}

fn default_completion_threshold() -> f64 {
    90.0
}

fn default_hide_delay() -> u64 {
    3
}
