//! Registry server binary

use anyhow::Result;
use registry_core::{Config, Registry};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("starting token registry server");

    // Load configuration
    let config = Config::from_env()?;

    // Open registry
    let registry = Registry::open(config).await?;
    tracing::info!(
        name = registry.name(),
        symbol = registry.symbol(),
        "registry opened"
    );

    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down registry server");
    registry.shutdown().await?;
    Ok(())
}
