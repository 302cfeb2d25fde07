//! Per-signal cooldown between forwarded events

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::ConfirmationEvent;

/// Limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterConfig {
    /// Minimum spacing between forwarded events for one signal (seconds)
    pub cooldown_seconds: u64,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 20,
        }
    }
}

/// Sliding-threshold cooldown gate, keyed by signal id.
///
/// Not a token bucket: everything inside the window after a forwarded
/// event is dropped, however many confirmations arrive.
#[derive(Debug)]
pub struct CooldownLimiter {
    cooldown: Duration,
    last_trigger: HashMap<String, Instant>,
    dropped: usize,
}

impl CooldownLimiter {
    pub fn new(config: LimiterConfig) -> Self {
        info!("Creating cooldown limiter: {}s", config.cooldown_seconds);
        Self {
            cooldown: Duration::from_secs(config.cooldown_seconds),
            last_trigger: HashMap::new(),
            dropped: 0,
        }
    }

    /// Forward the event if its signal is out of cooldown, recording `now`
    pub fn admit(&mut self, event: ConfirmationEvent, now: Instant) -> Option<ConfirmationEvent> {
        if let Some(last) = self.last_trigger.get(&event.signal_id) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < self.cooldown {
                self.dropped += 1;
                debug!(
                    "Confirmation for {} suppressed: in cooldown ({:.1}s of {}s)",
                    event.signal_id,
                    elapsed.as_secs_f64(),
                    self.cooldown.as_secs()
                );
                return None;
            }
        }

        self.last_trigger.insert(event.signal_id.clone(), now);
        Some(event)
    }

    /// Time left before `signal_id` accepts another event
    pub fn remaining(&self, signal_id: &str, now: Instant) -> Duration {
        self.last_trigger
            .get(signal_id)
            .map(|last| self.cooldown.saturating_sub(now.saturating_duration_since(*last)))
            .unwrap_or(Duration::ZERO)
    }

    /// Number of events dropped so far
    pub fn dropped_count(&self) -> usize {
        self.dropped
    }
}

impl Default for CooldownLimiter {
    fn default() -> Self {
        Self::new(LimiterConfig::default())
    }
}
