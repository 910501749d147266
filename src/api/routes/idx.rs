//! Indexer Proxy Routes
//!
//! Pass-through endpoints in front of the indexing provider.
//!
//! - GET /api/idx/latest - Latest messages (`limit`, `offset`, `chainIds`)
//! - GET /api/idx/search - Search messages (`content`, `limit`, `offset`)
//!
//! The upstream status code and JSON body are relayed unchanged.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::dto::{LatestParams, SearchParams};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::indexer::{Endpoint, RawResponse};

/// GET /api/idx/latest
pub async fn latest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LatestParams>,
) -> ApiResult<Response> {
    let upstream = state
        .indexer
        .forward(Endpoint::Latest, &params.forwarded())
        .await?;

    Ok(relay(Endpoint::Latest, upstream))
}

/// GET /api/idx/search
///
/// Requires a non-blank `content` parameter.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Response> {
    let forwarded = params
        .forwarded()
        .ok_or_else(|| ApiError::Validation("content parameter is required".to_string()))?;

    let upstream = state.indexer.forward(Endpoint::Search, &forwarded).await?;

    Ok(relay(Endpoint::Search, upstream))
}

fn relay(endpoint: Endpoint, upstream: RawResponse) -> Response {
    let status = match StatusCode::from_u16(upstream.status) {
        Ok(status) => status,
        Err(_) => {
            return ApiError::BadGateway(format!("invalid upstream status {}", upstream.status))
                .into_response()
        }
    };

    tracing::debug!(
        ?endpoint,
        status = upstream.status,
        bytes = upstream.body.len(),
        "Relayed indexer response"
    );

    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        upstream.body,
    )
        .into_response()
}
