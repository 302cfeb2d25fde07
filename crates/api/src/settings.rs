//! Server settings
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `COORD__*` environment variables (`__` separates sections, e.g.
//! `COORD__STATE__DWELL_SECONDS=15`).

use config::{Config, ConfigError, Environment, File};
use coordination::CoordinationConfig;
use serde::{Deserialize, Serialize};

/// Default config file, relative to the working directory, without extension
pub const DEFAULT_CONFIG_NAME: &str = "config/coordination";

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

/// Coordination server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address
    pub bind_addr: String,
    /// Serve Prometheus metrics on /metrics
    pub metrics_enabled: bool,
    pub log: LogSettings,
    pub state: CoordinationConfig,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            metrics_enabled: true,
            log: LogSettings::default(),
            state: CoordinationConfig::default(),
        }
    }
}

impl ServerSettings {
    /// Load settings. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("COORD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
