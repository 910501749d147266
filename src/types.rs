//! Core data types for memo messages
//!
//! This module defines the wire types shared by the proxy, the indexer client
//! and the feed:
//! - `Message`: one on-chain memo record
//! - `Pagination`: the provider-reported window
//! - `MessagePage`: the documented response envelope
//! - `FeedRequest`: a latest/search request expressed as data

use serde::{Deserialize, Serialize};

/// Default page size used by the proxy and the feed
pub const DEFAULT_LIMIT: u32 = 10;

/// A single on-chain memo message
///
/// Identity for deduplication purposes is `txn_hash`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Numeric chain id of the network that emitted the memo
    pub chain_id: u64,
    /// Block the transaction was included in
    pub block_number: u64,
    /// Block timestamp in unix seconds
    pub block_timestamp: i64,
    /// Transaction hash
    pub txn_hash: String,
    /// Sender address
    pub sender: String,
    /// Receiver address
    pub receiver: String,
    /// Memo text
    pub content: String,
    /// Value transferred alongside the memo
    pub value: f64,
}

/// Server-reported window over the most-recent-first message sequence
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
    /// Count reported by the server; may be a grand total or the window size
    pub count: u64,
}

impl Pagination {
    /// Whether more messages may exist past a window that returned `returned` items
    ///
    /// A full window always counts as "more may exist". `count` only extends
    /// that when it reports messages beyond the end of the window.
    pub fn has_more(&self, returned: usize) -> bool {
        let returned = returned as u64;
        let full = self.limit > 0 && returned >= u64::from(self.limit);
        full || self.count > u64::from(self.offset) + returned
    }
}

/// Response envelope returned by both `latest` and `search`
///
/// Anything that does not deserialize into this shape is a malformed payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessagePage {
    pub result: Vec<Message>,
    pub pagination: Pagination,
    /// Opaque search echo, present on search responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<serde_json::Value>,
}

impl MessagePage {
    /// Hash of the first (newest) message in the page
    pub fn newest_hash(&self) -> Option<&str> {
        self.result.first().map(|m| m.txn_hash.as_str())
    }
}

/// A request for a window of messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRequest {
    /// Most recent messages, optionally scoped to chains
    Latest {
        limit: u32,
        offset: u32,
        chain_ids: Vec<u64>,
    },
    /// Free-text search delegated to the provider
    Search {
        content: String,
        limit: u32,
        offset: u32,
    },
}

impl FeedRequest {
    /// Latest messages across all chains
    pub fn latest(limit: u32, offset: u32) -> Self {
        Self::Latest {
            limit,
            offset,
            chain_ids: Vec::new(),
        }
    }

    /// Search messages by content
    pub fn search(content: impl Into<String>, limit: u32, offset: u32) -> Self {
        Self::Search {
            content: content.into(),
            limit,
            offset,
        }
    }

    /// Builder method: scope a latest request to chains
    pub fn chains(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        if let Self::Latest { chain_ids, .. } = &mut self {
            chain_ids.extend(ids);
        }
        self
    }

    pub fn limit(&self) -> u32 {
        match self {
            Self::Latest { limit, .. } | Self::Search { limit, .. } => *limit,
        }
    }

    pub fn offset(&self) -> u32 {
        match self {
            Self::Latest { offset, .. } | Self::Search { offset, .. } => *offset,
        }
    }

    /// Query-string pairs in the provider's parameter names
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Latest {
                limit,
                offset,
                chain_ids,
            } => {
                let mut pairs = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
                if !chain_ids.is_empty() {
                    pairs.push(("chainIds", join_chain_ids(chain_ids)));
                }
                pairs
            }
            Self::Search {
                content,
                limit,
                offset,
            } => vec![
                ("content", content.clone()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ],
        }
    }
}

/// Render chain ids as the comma-separated `chainIds` parameter
pub fn join_chain_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a comma-separated `chainIds` value, skipping blanks
pub fn parse_chain_ids(raw: &str) -> Result<Vec<u64>, std::num::ParseIntError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}
