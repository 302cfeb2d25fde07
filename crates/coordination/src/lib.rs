//! Coordination State
//!
//! Owned state for the coordination service:
//! - Per-signal RED/GREEN machine with scheduled reversion
//! - Singleton hospital alert (IDLE -> INCOMING -> ACKNOWLEDGED)
//! - Snapshot accessors for the query surface

mod alert;
mod config;
mod signal;
mod store;

pub use alert::{AlertRecord, AlertStateMachine, AlertStatus};
pub use config::{AlertTemplate, CoordinationConfig, RepeatPolicy};
pub use signal::{Activation, SignalState, SignalStateMachine};
pub use store::{CoordinationStore, DetectionOutcome};

use thiserror::Error;

/// Coordination errors
#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("State lock poisoned: {0}")]
    LockPoisoned(String),
}
