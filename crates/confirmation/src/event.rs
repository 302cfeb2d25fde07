//! Confirmation event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signal used when none is configured or supplied
pub const DEFAULT_SIGNAL_ID: &str = "SIG_01";

/// A sighting that held long enough to be treated as real
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationEvent {
    /// Signal the ambulance is approaching
    pub signal_id: String,

    /// Correlation id, carried through to the coordination service logs
    pub event_id: Uuid,

    /// Wall-clock time of confirmation
    pub confirmed_at: DateTime<Utc>,
}

impl ConfirmationEvent {
    pub fn new(signal_id: impl Into<String>) -> Self {
        Self {
            signal_id: signal_id.into(),
            event_id: Uuid::new_v4(),
            confirmed_at: Utc::now(),
        }
    }
}
