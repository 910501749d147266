//! Data Transfer Objects
//!
//! Query parameters accepted by the proxy and response bodies it produces
//! itself. Message pages are relayed as raw upstream JSON and have no DTO
//! here.

use serde::{Deserialize, Serialize};

use crate::types::DEFAULT_LIMIT;

const DEFAULT_OFFSET: &str = "0";

/// Query parameters for `GET /api/idx/latest`
///
/// Values stay strings so they reach the provider exactly as sent.
#[derive(Debug, Default, Deserialize)]
pub struct LatestParams {
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub offset: Option<String>,
    /// Comma-separated chain ids
    #[serde(default, rename = "chainIds")]
    pub chain_ids: Option<String>,
}

impl LatestParams {
    /// Parameters to send upstream, with defaults filled in
    pub fn forwarded(self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", or_default(self.limit, &DEFAULT_LIMIT.to_string())),
            ("offset", or_default(self.offset, DEFAULT_OFFSET)),
        ];
        if let Some(chain_ids) = present(self.chain_ids) {
            params.push(("chainIds", chain_ids));
        }
        params
    }
}

/// Query parameters for `GET /api/idx/search`
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub offset: Option<String>,
}

impl SearchParams {
    /// Parameters to send upstream; `None` when `content` is blank
    pub fn forwarded(self) -> Option<Vec<(&'static str, String)>> {
        let content = self.content.filter(|c| !c.trim().is_empty())?;
        Some(vec![
            ("content", content),
            ("limit", or_default(self.limit, &DEFAULT_LIMIT.to_string())),
            ("offset", or_default(self.offset, DEFAULT_OFFSET)),
        ])
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn or_default(value: Option<String>, default: &str) -> String {
    present(value).unwrap_or_else(|| default.to_string())
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status
    pub status: String,
    /// Base URL requests are forwarded to
    pub upstream: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
