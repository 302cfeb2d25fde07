//! Agent settings
//!
//! Layered like the coordination server: defaults, optional TOML file,
//! then `PERCEPTION__*` environment variables
//! (e.g. `PERCEPTION__DISPATCH__BACKEND_URL=http://10.0.0.5:8000`).

use config::{Config, ConfigError, Environment, File};
use confirmation::{ConfirmConfig, LimiterConfig};
use dispatcher::DispatchConfig;
use geometry_filter::FilterConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default config file, relative to the working directory, without extension
pub const DEFAULT_CONFIG_NAME: &str = "config/perception";

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Max level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Where frames come from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Camera the detector is attached to
    pub camera_index: u32,
    /// Recorded detector output (JSON lines); required
    pub replay_path: Option<String>,
    /// Pause between frames (milliseconds), 0 to run flat out
    pub frame_interval_ms: u64,
}

impl SourceSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// Perception agent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionSettings {
    /// Expose Prometheus metrics over HTTP
    pub metrics_enabled: bool,
    /// Scrape endpoint listen address
    pub metrics_addr: String,
    pub log: LogSettings,
    pub source: SourceSettings,
    pub filter: FilterConfig,
    pub confirm: ConfirmConfig,
    pub limiter: LimiterConfig,
    pub dispatch: DispatchConfig,
}

impl Default for PerceptionSettings {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            metrics_addr: "0.0.0.0:9100".to_string(),
            log: LogSettings::default(),
            source: SourceSettings::default(),
            filter: FilterConfig::default(),
            confirm: ConfirmConfig::default(),
            limiter: LimiterConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl PerceptionSettings {
    /// Load settings. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("PERCEPTION")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
