//! Hospital alert state machine

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::{AlertTemplate, CoordinationError};

/// Alert lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    #[default]
    Idle,
    Incoming,
    Acknowledged,
}

/// Hospital-side alert
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub status: AlertStatus,
    pub message: String,
    pub eta_seconds: u32,
    pub emergency_type: String,
    pub severity: String,
    /// Mirrors `status == Acknowledged`
    pub acknowledged: bool,
}

/// Singleton alert. Every write replaces the record under one lock, so
/// `acknowledged` and `status` never disagree.
#[derive(Debug)]
pub struct AlertStateMachine {
    record: Mutex<AlertRecord>,
    template: AlertTemplate,
}

impl AlertStateMachine {
    pub fn new(template: AlertTemplate) -> Self {
        Self {
            record: Mutex::new(AlertRecord::default()),
            template,
        }
    }

    /// Overwrite with a fresh INCOMING alert, whatever the current status
    pub fn raise(&self) -> Result<AlertRecord, CoordinationError> {
        let mut record = self.lock()?;
        *record = AlertRecord {
            status: AlertStatus::Incoming,
            message: self.template.message.clone(),
            eta_seconds: self.template.eta_seconds,
            emergency_type: self.template.emergency_type.clone(),
            severity: self.template.severity.clone(),
            acknowledged: false,
        };
        metrics::counter!("alert_raised_total").increment(1);
        info!("Hospital alerted: {} (ETA {}s)", record.message, record.eta_seconds);
        Ok(record.clone())
    }

    /// Mark acknowledged. Accepted from any status, including IDLE.
    pub fn acknowledge(&self) -> Result<AlertRecord, CoordinationError> {
        let mut record = self.lock()?;
        record.status = AlertStatus::Acknowledged;
        record.acknowledged = true;
        metrics::counter!("alert_acknowledged_total").increment(1);
        info!("Hospital acknowledged alert");
        Ok(record.clone())
    }

    pub fn snapshot(&self) -> Result<AlertRecord, CoordinationError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, AlertRecord>, CoordinationError> {
        self.record
            .lock()
            .map_err(|e| CoordinationError::LockPoisoned(format!("alert: {}", e)))
    }
}

impl Default for AlertStateMachine {
    fn default() -> Self {
        Self::new(AlertTemplate::default())
    }
}
