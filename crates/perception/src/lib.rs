//! Perception Agent
//!
//! Frame-synchronous loop on the camera side:
//! - Pull per-frame detections from the detector boundary
//! - Geometric filter -> temporal confirmer -> cooldown limiter
//! - Hand forwarded events to the dispatcher without waiting on the network

pub mod agent;
pub mod pipeline;
pub mod settings;
pub mod source;

pub use agent::{PerceptionAgent, RunSummary};
pub use pipeline::{FrameReport, Pipeline};
pub use settings::{LogSettings, PerceptionSettings, SourceSettings};
pub use source::{DetectionSource, ReplaySource};

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use thiserror::Error;
use tracing::{info, warn, Level};

/// Perception error types
#[derive(Error, Debug)]
pub enum PerceptionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Detection source failed: {0}")]
    Source(String),

    #[error("Malformed frame at line {line}: {reason}")]
    Frame { line: usize, reason: String },

    #[error(transparent)]
    Dispatch(#[from] dispatcher::DispatchError),
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

/// Parse the scrape address; a bad address is a configuration error
pub fn metrics_listen_addr(settings: &PerceptionSettings) -> Result<SocketAddr, PerceptionError> {
    settings.metrics_addr.parse().map_err(|e| {
        PerceptionError::Config(format!("invalid metrics_addr {:?}: {}", settings.metrics_addr, e))
    })
}

/// Install the Prometheus recorder with its own scrape listener.
///
/// Must be called from within a tokio runtime. A recorder that cannot be
/// installed is logged and the agent runs without metrics.
pub fn init_metrics(settings: &PerceptionSettings) -> Result<(), PerceptionError> {
    if !settings.metrics_enabled {
        return Ok(());
    }

    let addr = metrics_listen_addr(settings)?;
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => info!("Serving metrics on http://{}/metrics", addr),
        Err(e) => warn!("Prometheus recorder not installed: {}", e),
    }
    Ok(())
}
