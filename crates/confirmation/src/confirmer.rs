//! Continuous-presence confirmation

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::{ConfirmError, ConfirmationEvent};

/// Confirmer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmConfig {
    /// How long the target must stay visible without a single miss (seconds)
    pub confirm_duration_secs: f64,

    /// Signal the confirmed events are addressed to
    pub signal_id: String,
}

impl Default for ConfirmConfig {
    fn default() -> Self {
        Self {
            confirm_duration_secs: 2.5,
            signal_id: crate::DEFAULT_SIGNAL_ID.to_string(),
        }
    }
}

impl ConfirmConfig {
    pub fn confirm_duration(&self) -> Result<Duration, ConfirmError> {
        Duration::try_from_secs_f64(self.confirm_duration_secs)
            .map_err(|_| ConfirmError::InvalidDuration(self.confirm_duration_secs))
    }
}

/// Emits an event once a qualifying run outlasts the confirm duration.
///
/// A single non-qualifying frame clears the pending run; there are no
/// grace frames. After emitting, the confirmer re-arms on the next
/// qualifying frame, so an unbroken run produces one event per
/// `confirm_duration` and relies on the cooldown limiter to drop repeats.
#[derive(Debug)]
pub struct TemporalConfirmer {
    confirm_duration: Duration,
    signal_id: String,
    pending_since: Option<Instant>,
}

impl TemporalConfirmer {
    /// Fails if the configured duration is negative, NaN or too large
    pub fn new(config: ConfirmConfig) -> Result<Self, ConfirmError> {
        Ok(Self {
            confirm_duration: config.confirm_duration()?,
            signal_id: config.signal_id,
            pending_since: None,
        })
    }

    /// Feed one frame's verdict observed at `now`
    pub fn observe(&mut self, qualifying: bool, now: Instant) -> Option<ConfirmationEvent> {
        if !qualifying {
            if self.pending_since.take().is_some() {
                debug!("Qualifying run broken, confirmation timer reset");
            }
            return None;
        }

        match self.pending_since {
            None => {
                debug!("Qualifying run started");
                self.pending_since = Some(now);
                None
            }
            Some(since) if now.saturating_duration_since(since) >= self.confirm_duration => {
                self.pending_since = None;
                info!(
                    "Ambulance confirmed after {:.2}s of continuous presence",
                    now.saturating_duration_since(since).as_secs_f64()
                );
                Some(ConfirmationEvent::new(self.signal_id.clone()))
            }
            Some(_) => None,
        }
    }

    /// Whether a qualifying run is in progress
    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }
}
