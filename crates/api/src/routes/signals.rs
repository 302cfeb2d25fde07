//! Signal Routes

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use coordination::SignalState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::{ApiError, SharedState};

/// Body of `POST /ambulance/detected`
#[derive(Debug, Deserialize)]
pub struct DetectedRequest {
    /// Signal the ambulance is approaching
    #[serde(default = "default_signal_id")]
    pub signal_id: String,
    /// Correlation id assigned by the perception agent
    #[serde(default)]
    pub event_id: Option<Uuid>,
    /// When the perception agent confirmed the sighting
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
}

fn default_signal_id() -> String {
    "SIG_01".to_string()
}

impl DetectedRequest {
    fn validate(&self) -> Result<&str, ApiError> {
        let id = self.signal_id.trim();
        if id.is_empty() {
            return Err(ApiError::InvalidRequest("signal_id must not be empty".to_string()));
        }
        Ok(id)
    }
}

/// Response for the detection endpoint
#[derive(Debug, Serialize)]
pub struct DetectedResponse {
    pub status: String,
    pub signal_id: String,
    pub signal_state: SignalState,
}

/// Confirmed sighting from the perception agent
pub async fn ambulance_detected(
    State(state): State<SharedState>,
    Json(request): Json<DetectedRequest>,
) -> Result<Json<DetectedResponse>, ApiError> {
    let signal_id = request.validate()?;

    if let Some(event_id) = request.event_id {
        let lag_ms = request
            .confirmed_at
            .map(|at| (Utc::now() - at).num_milliseconds());
        info!("Detection event {} received (lag {:?} ms)", event_id, lag_ms);
    }

    let outcome = state.store.on_detected(signal_id)?;

    Ok(Json(DetectedResponse {
        status: "signal + hospital alert triggered".to_string(),
        signal_id: outcome.signal_id,
        signal_state: outcome.signal_state,
    }))
}

/// Every known signal and its current state
pub async fn get_signal_state(
    State(state): State<SharedState>,
) -> Result<Json<BTreeMap<String, SignalState>>, ApiError> {
    Ok(Json(state.store.signal_snapshot()?))
}
