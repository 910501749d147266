//! Memoscope Proxy API
//!
//! Thin HTTP layer in front of the indexing provider, built with Axum.
//!
//! # Endpoints
//!
//! ## Indexer
//! - `GET /api/idx/latest` - Latest messages
//! - `GET /api/idx/search` - Search messages by content
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Status with upstream and uptime
//!
//! # Example
//!
//! ```rust,ignore
//! use memoscope::api::{serve, AppState};
//! use memoscope::config::ApiConfig;
//! use memoscope::indexer::{IndexerClient, IndexerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let indexer = Arc::new(IndexerClient::new(IndexerConfig::default())?);
//!     let config = ApiConfig::default();
//!
//!     serve(AppState::new(indexer, config.clone()), &config).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    error_handling::HandleErrorLayer,
    http::{HeaderValue, Method},
    routing::get,
    BoxError, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ApiConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let idx_routes = Router::new()
        .route("/latest", get(routes::idx::latest))
        .route("/search", get(routes::idx::search));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/idx", idx_routes)
        .nest("/health", health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(timeout),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Turn router-level timeouts into the same 504 envelope as upstream timeouts
async fn handle_middleware_error(error: BoxError) -> ApiError {
    if error.is::<tower::timeout::error::Elapsed>() {
        ApiError::GatewayTimeout
    } else {
        ApiError::Internal(format!("Unhandled middleware error: {}", error))
    }
}

/// Permissive CORS unless specific origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET])
}

/// Start the proxy server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Memoscope proxy listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Memoscope proxy shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::{IndexerClient, IndexerConfig};
    use axum::{
        body::Body,
        extract::Query,
        http::{Request, StatusCode},
        Json,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tower::util::ServiceExt;

    /// Fake indexing provider that echoes the query it received
    async fn spawn_upstream() -> String {
        let app = Router::new()
            .route(
                "/latest-messages",
                get(|Query(query): Query<HashMap<String, String>>| async move {
                    Json(json!({
                        "result": [{
                            "chainId": 1,
                            "blockNumber": 19000000,
                            "blockTimestamp": 1717000000,
                            "txnHash": "0xabc",
                            "sender": "0x01",
                            "receiver": "0x02",
                            "content": "gm",
                            "value": 0
                        }],
                        "pagination": {"limit": 10, "offset": 0, "count": 1},
                        "echo": query
                    }))
                }),
            )
            .route(
                "/search-messages",
                get(|| async {
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(json!({"error": "search index rebuilding"})),
                    )
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    /// Provider that answers long after any test timeout
    async fn spawn_slow_upstream() -> String {
        let app = Router::new().route(
            "/latest-messages",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Json(json!({}))
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn create_test_app(upstream: &str) -> Router {
        let indexer = IndexerClient::new(IndexerConfig {
            base_url: upstream.to_string(),
            request_timeout_ms: 2000,
            ..Default::default()
        })
        .unwrap();

        build_router(AppState::new(Arc::new(indexer), ApiConfig::default()))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app("http://127.0.0.1:9");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let app = create_test_app("http://127.0.0.1:9");
        let (status, body) = get_json(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["upstream"], "http://127.0.0.1:9");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_latest_applies_defaults() {
        let upstream = spawn_upstream().await;
        let (status, body) = get_json(create_test_app(&upstream), "/api/idx/latest").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["echo"]["limit"], "10");
        assert_eq!(body["echo"]["offset"], "0");
        assert!(body["echo"].get("chainIds").is_none());
        assert_eq!(body["result"][0]["txnHash"], "0xabc");
    }

    #[tokio::test]
    async fn test_latest_forwards_verbatim() {
        let upstream = spawn_upstream().await;
        let (status, body) = get_json(
            create_test_app(&upstream),
            "/api/idx/latest?limit=3&offset=30&chainIds=1,8453",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["echo"]["limit"], "3");
        assert_eq!(body["echo"]["offset"], "30");
        assert_eq!(body["echo"]["chainIds"], "1,8453");
    }

    #[tokio::test]
    async fn test_search_relays_upstream_status() {
        let upstream = spawn_upstream().await;
        let (status, body) =
            get_json(create_test_app(&upstream), "/api/idx/search?content=gm").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({"error": "search index rebuilding"}));
    }

    #[tokio::test]
    async fn test_search_requires_content() {
        let upstream = spawn_upstream().await;

        let (status, body) = get_json(create_test_app(&upstream), "/api/idx/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) =
            get_json(create_test_app(&upstream), "/api/idx/search?content=%20%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        let (status, body) = get_json(create_test_app("http://127.0.0.1:9"), "/api/idx/latest").await;

        assert!(status == StatusCode::BAD_GATEWAY || status == StatusCode::GATEWAY_TIMEOUT);
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_router_timeout_is_gateway_timeout() {
        let upstream = spawn_slow_upstream().await;
        let indexer = IndexerClient::new(IndexerConfig {
            base_url: upstream,
            request_timeout_ms: 10_000,
            ..Default::default()
        })
        .unwrap();
        let config = ApiConfig {
            request_timeout_secs: 1,
            ..Default::default()
        };
        let app = build_router(AppState::new(Arc::new(indexer), config));

        let (status, body) = get_json(app, "/api/idx/latest").await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"]["code"], "UPSTREAM_TIMEOUT");
        assert!(body["request_id"].is_string());
    }

    #[test]
    fn test_cors_layer_skips_invalid_origins() {
        // Construction must not panic on bad input
        let _ = cors_layer(&["http://localhost:3000".to_string(), "bad\norigin".to_string()]);
        let _ = cors_layer(&[]);
    }
}
