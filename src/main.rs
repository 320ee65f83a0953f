/// Explorer Gateway
///
/// Serves the explorer API backed by a node's JSON-RPC and a transaction
/// indexer. Configuration comes from the environment (see `GatewayConfig`).

use anyhow::{Context, Result};
use std::sync::Arc;

use explorer_gateway::{api, build_explorer, GatewayConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting explorer gateway...");

    let config = GatewayConfig::from_env().context("Failed to load configuration")?;

    log::info!("Node RPC URL: {}", config.rpc_url);
    log::info!("Indexer URL: {}", config.indexer_url);
    log::info!("Network: {}", config.network);
    log::info!(
        "Page size: default {}, max {}",
        config.pages.default_page_size,
        config.pages.max_page_size
    );

    let explorer = build_explorer(&config).context("Failed to connect upstream services")?;
    let cors = api::cors_layer(config.allowed_origins.as_deref());

    api::run_server(Arc::new(explorer), cors, &config.server_host, config.server_port)
        .await
        .context("Server error")?;

    Ok(())
}
