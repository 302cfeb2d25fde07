//! Perception Agent - Main Entry Point

use anyhow::Context;
use perception::{init_logging, init_metrics, PerceptionAgent, PerceptionSettings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);
    let settings = PerceptionSettings::load(config_path.as_deref())
        .with_context(|| match &config_path {
            Some(path) => format!("failed to load settings from {}", path),
            None => "failed to load settings".to_string(),
        })?;

    init_logging(&settings.log)?;

    info!("=== Ambulance Perception Agent v{} ===", env!("CARGO_PKG_VERSION"));

    init_metrics(&settings).context("metrics exporter could not start")?;

    let mut agent = PerceptionAgent::from_settings(&settings)
        .context("perception agent could not start")?;
    agent.run().await?;

    Ok(())
}
