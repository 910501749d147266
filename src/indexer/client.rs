//! Indexer REST API Client
//!
//! HTTP client for the memo indexing provider, or for a memoscope proxy that
//! fronts it. Both expose the same response envelope under different paths.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use super::MessageSource;
use crate::types::{FeedRequest, MessagePage};

/// Default indexing provider
pub const DEFAULT_INDEXER_URL: &str = "https://api.memoindex.xyz";

/// Which API layout the base URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFlavor {
    /// The indexing provider: `/latest-messages`, `/search-messages`
    Provider,
    /// A memoscope proxy: `/api/idx/latest`, `/api/idx/search`
    Proxy,
}

/// The two operations the indexer exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Latest,
    Search,
}

impl Endpoint {
    /// Path under the base URL for the given flavor
    pub fn path(self, flavor: ApiFlavor) -> &'static str {
        match (flavor, self) {
            (ApiFlavor::Provider, Endpoint::Latest) => "/latest-messages",
            (ApiFlavor::Provider, Endpoint::Search) => "/search-messages",
            (ApiFlavor::Proxy, Endpoint::Latest) => "/api/idx/latest",
            (ApiFlavor::Proxy, Endpoint::Search) => "/api/idx/search",
        }
    }
}

impl From<&FeedRequest> for Endpoint {
    fn from(request: &FeedRequest) -> Self {
        match request {
            FeedRequest::Latest { .. } => Endpoint::Latest,
            FeedRequest::Search { .. } => Endpoint::Search,
        }
    }
}

/// Configuration for the indexer client
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// API layout behind the base URL
    pub flavor: ApiFlavor,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INDEXER_URL.to_string(),
            flavor: ApiFlavor::Provider,
            request_timeout_ms: 10_000,
        }
    }
}

impl IndexerConfig {
    /// Point at a memoscope proxy instead of the provider
    pub fn proxy(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            flavor: ApiFlavor::Proxy,
            ..Default::default()
        }
    }
}

/// Upstream response relayed without interpretation
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Indexer REST API client
pub struct IndexerClient {
    client: Client,
    config: IndexerConfig,
}

impl IndexerClient {
    /// Create a new indexer client with the given configuration
    pub fn new(mut config: IndexerConfig) -> Result<Self, IndexerError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { client, config })
    }

    /// Get the base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.config.base_url, endpoint.path(self.config.flavor))
    }

    /// Forward query parameters verbatim and return status and body untouched
    ///
    /// Any HTTP status, including errors, is a successful relay. Only transport
    /// failures are errors.
    pub async fn forward(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
    ) -> Result<RawResponse, IndexerError> {
        let url = self.url(endpoint);
        tracing::debug!(url = %url, ?params, "Forwarding to indexer");

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?.to_vec();

        Ok(RawResponse { status, body })
    }

    /// Fetch and decode a page of messages
    pub async fn fetch_page(&self, request: &FeedRequest) -> Result<MessagePage, IndexerError> {
        let raw = self
            .forward(Endpoint::from(request), &request.query_pairs())
            .await?;

        if !(200..300).contains(&raw.status) {
            return Err(IndexerError::ApiError {
                status: raw.status,
                message: String::from_utf8_lossy(&raw.body).into_owned(),
            });
        }

        serde_json::from_slice(&raw.body).map_err(|e| IndexerError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl MessageSource for IndexerClient {
    fn name(&self) -> &str {
        &self.config.base_url
    }

    async fn fetch(&self, request: &FeedRequest) -> Result<MessagePage, IndexerError> {
        self.fetch_page(request).await
    }
}

fn classify(e: reqwest::Error) -> IndexerError {
    if e.is_timeout() {
        IndexerError::Timeout
    } else if e.is_connect() {
        IndexerError::Unavailable
    } else {
        IndexerError::Request(e)
    }
}

// ============================================
// Errors
// ============================================

/// Errors that can occur when talking to the indexer
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Indexer unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Malformed response: {0}")]
    Malformed(String),
}
