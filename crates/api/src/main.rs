//! Coordination Server - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, ServerSettings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);
    let settings = ServerSettings::load(config_path.as_deref())
        .with_context(|| match &config_path {
            Some(path) => format!("failed to load settings from {}", path),
            None => "failed to load settings".to_string(),
        })?;

    init_logging(&settings.log)?;

    info!("=== Signal Priority Coordination v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Dwell {}s, repeat policy {:?}",
        settings.state.dwell_seconds, settings.state.repeat_policy
    );

    run_server(settings).await
}
