//! Detection Confirmation
//!
//! Turns a noisy per-frame "ambulance visible" stream into rare,
//! deliberate events:
//! - Continuous-presence confirmation (any miss restarts the timer)
//! - Per-signal cooldown between forwarded events

mod confirmer;
mod event;
mod limiter;

pub use confirmer::{ConfirmConfig, TemporalConfirmer};
pub use event::{ConfirmationEvent, DEFAULT_SIGNAL_ID};
pub use limiter::{CooldownLimiter, LimiterConfig};

use thiserror::Error;

/// Confirmation error types
#[derive(Error, Debug)]
pub enum ConfirmError {
    #[error("confirm_duration_secs must be a finite, non-negative number of seconds, got {0}")]
    InvalidDuration(f64),
}
