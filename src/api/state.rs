//! Application State
//!
//! Shared state accessible by all proxy handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::config::ApiConfig;
use crate::indexer::IndexerClient;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Client for the indexing provider
    pub indexer: Arc<IndexerClient>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(indexer: Arc<IndexerClient>, config: ApiConfig) -> Self {
        Self {
            indexer,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
