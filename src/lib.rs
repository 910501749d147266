//! # Memoscope
//!
//! Live feed, search and proxy for on-chain memo messages emitted across
//! several blockchain networks, sourced from an external indexing API.
//!
//! ## Features
//!
//! - **Proxy**: pass-through `latest` and `search` endpoints in front of the provider
//! - **Live feed**: polling for new messages with explicit refresh-on-new-data
//! - **Search**: free-text search delegated to the provider
//! - **Chain filtering**: client-side filtering by chain id
//! - **Pagination**: offset/limit windows with duplicate-free merging
//!
//! ## Modules
//!
//! - [`feed`]: Feed state machine, reconciliation and async driver
//! - [`indexer`]: REST client for the provider or a proxy
//! - [`api`]: Proxy server with Axum
//! - [`format`]: Display helpers for message fields
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use memoscope::feed::{FeedController, FeedSettings, DEFAULT_POLL_INTERVAL};
//! use memoscope::indexer::{IndexerClient, IndexerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(IndexerClient::new(IndexerConfig::proxy("http://localhost:8082"))?);
//!     let feed = Arc::new(FeedController::new(
//!         source,
//!         FeedSettings::default(),
//!         DEFAULT_POLL_INTERVAL,
//!     ));
//!
//!     feed.load().await;
//!     let poller = Arc::clone(&feed).start_polling();
//!
//!     for message in feed.snapshot().await.visible_messages() {
//!         println!("{}: {}", message.txn_hash, message.content);
//!     }
//!
//!     poller.abort();
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chains;
pub mod config;
pub mod feed;
pub mod format;
pub mod indexer;
pub mod logging;
pub mod types;

// Re-export top-level types for convenience
pub use types::{FeedRequest, Message, MessagePage, Pagination};

pub use chains::ChainDescriptor;

pub use feed::{FeedController, FeedEvent, FeedSettings, FeedState, Outcome, Phase};

pub use indexer::{ApiFlavor, IndexerClient, IndexerConfig, IndexerError, MessageSource};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{ApiConfig, Config, ConfigError, FeedConfig, IndexerSection, LoggingConfig};
