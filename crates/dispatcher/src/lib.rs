//! Event Dispatcher
//!
//! Delivers confirmed sightings to the coordination service:
//! - JSON POST to `/ambulance/detected`
//! - Bounded per-request timeout
//! - Spawned off the frame loop, failures are logged and dropped

use confirmation::ConfirmationEvent;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Dispatch error types
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Coordination service returned HTTP {0}")]
    Status(u16),

    #[error("Invalid response body: {0}")]
    InvalidResponse(String),
}

/// Dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Base URL of the coordination service
    pub backend_url: String,
    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 3000,
        }
    }
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Full URL of the detection endpoint
    pub fn detected_url(&self) -> String {
        format!("{}/ambulance/detected", self.backend_url.trim_end_matches('/'))
    }
}

/// Success acknowledgement from the coordination service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    pub status: String,
    #[serde(default)]
    pub signal_id: Option<String>,
    #[serde(default)]
    pub signal_state: Option<String>,
}

/// HTTP dispatcher for confirmation events
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    http_client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl EventDispatcher {
    /// Create a dispatcher; fails only if the HTTP client cannot be built
    pub fn new(config: &DispatchConfig) -> Result<Self, DispatchError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DispatchError::Client(e.to_string()))?;

        info!("Dispatching confirmations to {}", config.detected_url());
        Ok(Self {
            http_client,
            url: config.detected_url(),
            timeout: config.timeout(),
        })
    }

    /// Send the event and wait for the service's acknowledgement
    pub async fn send(&self, event: &ConfirmationEvent) -> Result<DispatchReceipt, DispatchError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status.as_u16()));
        }

        response
            .json::<DispatchReceipt>()
            .await
            .map_err(|e| DispatchError::InvalidResponse(e.to_string()))
    }

    /// Fire-and-forget: spawn the send, log the outcome, never block the caller.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, event: ConfirmationEvent) -> JoinHandle<Result<DispatchReceipt, DispatchError>> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let result = dispatcher.send(&event).await;
            match &result {
                Ok(receipt) => {
                    metrics::counter!("dispatch_success_total").increment(1);
                    info!(
                        "Confirmation {} delivered for {}: {}",
                        event.event_id, event.signal_id, receipt.status
                    );
                }
                Err(e) => {
                    metrics::counter!("dispatch_failure_total").increment(1);
                    warn!(
                        "Confirmation {} for {} not delivered: {}",
                        event.event_id, event.signal_id, e
                    );
                }
            }
            result
        })
    }

    fn classify(&self, err: reqwest::Error) -> DispatchError {
        if err.is_timeout() {
            DispatchError::Timeout(self.timeout)
        } else {
            DispatchError::Transport(err.to_string())
        }
    }
}
