//! Signal Priority Coordination Service
//!
//! REST surface over the signal and hospital alert state machines.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use coordination::CoordinationStore;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};

mod error;
pub mod routes;
pub mod settings;

pub use error::ApiError;
pub use settings::{LogSettings, ServerSettings};

/// Application state shared across handlers
pub struct AppState {
    /// Signal and alert machines
    pub store: CoordinationStore,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    /// Prometheus exporter, when installed
    pub metrics: Option<PrometheusHandle>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create new application state
    pub fn new(store: CoordinationStore, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            store,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            metrics,
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub signal_count: usize,
}

#[derive(Debug, Serialize)]
struct RootResponse {
    message: &'static str,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/ambulance/detected", post(routes::signals::ambulance_detected))
        .route("/signal/state", get(routes::signals::get_signal_state))
        .route("/hospital/acknowledge", post(routes::hospital::acknowledge))
        .route("/hospital/alert", get(routes::hospital::get_alert))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Backend is running",
    })
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> Result<Json<HealthResponse>, ApiError> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        signal_count: state.store.signal_snapshot()?.len(),
    }))
}

async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Initialize logging
pub fn init_logging(settings: &LogSettings) -> anyhow::Result<()> {
    let level: Level = settings
        .level
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid log level {:?}: {}", settings.level, e))?;

    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true);

    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {}", e))
}

/// Run the server until Ctrl-C
pub async fn run_server(settings: ServerSettings) -> anyhow::Result<()> {
    let metrics = if settings.metrics_enabled {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Prometheus recorder not installed: {}", e);
                None
            }
        }
    } else {
        None
    };

    let store = CoordinationStore::new(&settings.state)?;
    let state = Arc::new(AppState::new(store, metrics));
    let app = create_router(state);

    info!("Starting coordination server on {}", settings.bind_addr);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Coordination server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl-C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use coordination::CoordinationConfig;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        let store = CoordinationStore::new(&CoordinationConfig::default()).unwrap();
        create_router(Arc::new(AppState::new(store, None)))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let app = app();

        let (status, body) = call(&app, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Backend is running");

        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["signal_count"], 1);
    }

    #[tokio::test]
    async fn test_initial_state() {
        let app = app();

        let (_, signals) = call(&app, Method::GET, "/signal/state", None).await;
        assert_eq!(signals, json!({ "SIG_01": "RED" }));

        let (_, alert) = call(&app, Method::GET, "/hospital/alert", None).await;
        assert_eq!(alert["status"], "IDLE");
        assert_eq!(alert["acknowledged"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_turns_green_then_reverts() {
        let app = app();

        let (status, body) = call(
            &app,
            Method::POST,
            "/ambulance/detected",
            Some(json!({ "signal_id": "SIG_01" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "signal + hospital alert triggered");
        assert_eq!(body["signal_state"], "GREEN");

        let (_, alert) = call(&app, Method::GET, "/hospital/alert", None).await;
        assert_eq!(alert["status"], "INCOMING");
        assert_eq!(alert["eta_seconds"], 180);
        assert_eq!(alert["emergency_type"], "Trauma");
        assert_eq!(alert["severity"], "Critical");

        tokio::time::sleep(Duration::from_secs(11)).await;
        let (_, signals) = call(&app, Method::GET, "/signal/state", None).await;
        assert_eq!(signals["SIG_01"], "RED");
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_id_defaults_to_sig_01() {
        let app = app();

        let (status, body) = call(&app, Method::POST, "/ambulance/detected", Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["signal_id"], "SIG_01");
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_accepts_perception_payload() {
        let app = app();

        let payload = json!({
            "signal_id": "SIG_02",
            "event_id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "confirmed_at": "2026-10-18T09:30:00Z",
        });
        let (status, _) = call(&app, Method::POST, "/ambulance/detected", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, signals) = call(&app, Method::GET, "/signal/state", None).await;
        assert_eq!(signals, json!({ "SIG_01": "RED", "SIG_02": "GREEN" }));
    }

    #[tokio::test]
    async fn test_empty_signal_id_rejected() {
        let app = app();

        let (status, body) = call(
            &app,
            Method::POST,
            "/ambulance/detected",
            Some(json!({ "signal_id": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("signal_id"));
    }

    #[tokio::test]
    async fn test_acknowledge_from_idle() {
        let app = app();

        let (status, body) = call(&app, Method::POST, "/hospital/acknowledge", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "acknowledged");

        let (_, alert) = call(&app, Method::GET, "/hospital/alert", None).await;
        assert_eq!(alert["status"], "ACKNOWLEDGED");
        assert_eq!(alert["acknowledged"], true);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_after_ack_rearms_alert() {
        let app = app();

        call(&app, Method::POST, "/ambulance/detected", Some(json!({}))).await;
        call(&app, Method::POST, "/hospital/acknowledge", None).await;
        call(&app, Method::POST, "/ambulance/detected", Some(json!({}))).await;

        let (_, alert) = call(&app, Method::GET, "/hospital/alert", None).await;
        assert_eq!(alert["status"], "INCOMING");
        assert_eq!(alert["acknowledged"], false);
    }

    #[tokio::test]
    async fn test_metrics_disabled_returns_not_found() {
        let app = app();
        let (status, _) = call(&app, Method::GET, "/metrics", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
