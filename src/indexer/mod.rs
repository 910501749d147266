//! Indexer Integration
//!
//! Access to the external memo indexing provider.
//!
//! ## Architecture
//!
//! - **IndexerClient**: REST client for the provider or a memoscope proxy
//! - **MessageSource**: the seam the feed fetches through

mod client;

pub use client::{
    ApiFlavor, Endpoint, IndexerClient, IndexerConfig, IndexerError, RawResponse,
    DEFAULT_INDEXER_URL,
};

use async_trait::async_trait;

use crate::types::{FeedRequest, MessagePage};

/// Anything that can answer a feed request with a page of messages
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &str;

    /// Fetch one window of messages
    async fn fetch(&self, request: &FeedRequest) -> Result<MessagePage, IndexerError>;
}
