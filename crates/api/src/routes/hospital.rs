//! Hospital Routes

use axum::{extract::State, Json};
use coordination::AlertRecord;
use serde::Serialize;

use crate::{ApiError, SharedState};

/// Response for the acknowledge endpoint
#[derive(Debug, Serialize)]
pub struct AcknowledgeResponse {
    pub status: String,
}

/// Hospital acknowledges the incoming ambulance
pub async fn acknowledge(
    State(state): State<SharedState>,
) -> Result<Json<AcknowledgeResponse>, ApiError> {
    state.store.acknowledge()?;
    Ok(Json(AcknowledgeResponse {
        status: "acknowledged".to_string(),
    }))
}

/// Current alert
pub async fn get_alert(State(state): State<SharedState>) -> Result<Json<AlertRecord>, ApiError> {
    Ok(Json(state.store.alert_snapshot()?))
}
