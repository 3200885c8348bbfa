//! Monitor configuration.

use anyhow::Result;
use hookwatch_core::aggregator::{DEFAULT_BACKLOG, DEFAULT_RESCAN_INTERVAL};
use hookwatch_core::tailer::DEFAULT_POLL_INTERVAL;
use hookwatch_core::RenderOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the configured log directory.
pub const LOG_DIR_ENV: &str = "HOOKWATCH_LOG_DIR";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_rescan_interval_ms")]
    pub rescan_interval_ms: u64,
    #[serde(default = "default_backlog")]
    pub backlog: usize,
    /// Width used when stdout is not a terminal.
    #[serde(default = "default_fallback_width")]
    pub fallback_width: usize,
}

fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hookwatch")
        .join("logs")
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_rescan_interval_ms() -> u64 {
    DEFAULT_RESCAN_INTERVAL.as_millis() as u64
}

fn default_backlog() -> usize {
    DEFAULT_BACKLOG
}

fn default_fallback_width() -> usize {
    RenderOptions::default().width
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            poll_interval_ms: default_poll_interval_ms(),
            rescan_interval_ms: default_rescan_interval_ms(),
            backlog: default_backlog(),
            fallback_width: default_fallback_width(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from `<config_dir>/hookwatch/config.toml` or fall back to
    /// defaults.
    pub fn load() -> Result<Self> {
        let from_file = dirs::config_dir()
            .map(|dir| dir.join("hookwatch").join("config.toml"))
            .filter(|path| path.exists());

        match from_file {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    /// Apply `HOOKWATCH_LOG_DIR` when it is set and non-empty.
    pub fn apply_env(&mut self) {
        self.override_log_dir(std::env::var_os(LOG_DIR_ENV).map(PathBuf::from));
    }

    fn override_log_dir(&mut self, log_dir: Option<PathBuf>) {
        if let Some(dir) = log_dir.filter(|d| !d.as_os_str().is_empty()) {
            self.log_dir = dir;
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn rescan_interval(&self) -> Duration {
        Duration::from_millis(self.rescan_interval_ms.max(1))
    }
}
