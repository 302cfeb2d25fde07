//! Coordination configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a confirmed event does to a signal that is already GREEN
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Keep the pending reversion; the event only re-alerts the hospital
    #[default]
    Ignore,
    /// Cancel the pending reversion and start a fresh dwell period
    Extend,
}

/// Fields written into the alert on every INCOMING transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertTemplate {
    pub message: String,
    pub eta_seconds: u32,
    pub emergency_type: String,
    pub severity: String,
}

impl Default for AlertTemplate {
    fn default() -> Self {
        Self {
            message: "Incoming ambulance detected. Prepare ER.".to_string(),
            eta_seconds: 180,
            emergency_type: "Trauma".to_string(),
            severity: "Critical".to_string(),
        }
    }
}

/// Coordination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationConfig {
    /// How long a signal stays GREEN before reverting (seconds)
    pub dwell_seconds: u64,

    /// Signals known at startup; others are created on first event
    pub seed_signals: Vec<String>,

    /// Handling of events for a signal that is already GREEN
    pub repeat_policy: RepeatPolicy,

    /// Alert contents
    pub alert: AlertTemplate,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            dwell_seconds: 10,
            seed_signals: vec!["SIG_01".to_string()],
            repeat_policy: RepeatPolicy::Ignore,
            alert: AlertTemplate::default(),
        }
    }
}

impl CoordinationConfig {
    pub fn dwell(&self) -> Duration {
        Duration::from_secs(self.dwell_seconds)
    }
}
