//! Memoscope Proxy Server
//!
//! Run with: cargo run --bin memoscope
//!
//! # Configuration
//!
//! Config file (first found): `$XDG_CONFIG_HOME/memoscope/config.toml`,
//! `/etc/memoscope/config.toml`, `./config.toml`.
//!
//! Environment variables:
//! - `MEMOSCOPE_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `MEMOSCOPE_API_PORT`: Port to listen on (default: 8082)
//! - `MEMOSCOPE_INDEXER_URL`: Indexing provider base URL
//! - `MEMOSCOPE_LOG_LEVEL` / `MEMOSCOPE_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Overrides the log filter

use memoscope::api::{serve, AppState};
use memoscope::config::Config;
use memoscope::indexer::IndexerClient;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();
    memoscope::logging::init(&config.logging);

    tracing::info!("Starting Memoscope proxy v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Forwarding to indexer at {}", config.indexer.base_url);

    let indexer = Arc::new(IndexerClient::new(config.indexer.client_config())?);
    let state = AppState::new(indexer, config.api.clone());

    serve(state, &config.api).await?;

    tracing::info!("Memoscope proxy stopped");
    Ok(())
}
