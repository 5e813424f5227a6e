//! # Lifecycle HTTP API Module
//!
//! This module implements the HTTP server using axum.
//!
//! ## Endpoints
//!
//! - `GET /api/lifecycle` - All stages
//! - `GET /api/connections` - All stage-to-stage connections
//! - `GET /api/substages/all` - All substages with their stage
//! - `GET /api/substages/{stage}` - Substages of one stage
//! - `GET /api/tools/{stage}` - Tools of one stage
//! - `GET /api/health` - Health check
//! - `GET /{anypath}` - Front-end bundle, falling back to `index.html`
//!
//! Storage failures on any resource endpoint produce `500 {"error": ...}`.

mod assets;
mod error;
mod handlers;
mod middleware;
mod types;

// Re-exports for external use and integration tests (via `lifecycle::api::*`)
pub use assets::{INDEX_DOCUMENT, spa_service};
pub use error::ApiError;
pub use handlers::{
    all_substages_handler, connections_handler, health_handler, lifecycle_handler,
    substages_handler, tools_handler,
};
pub use middleware::{GlobalRateLimiter, create_rate_limiter, rate_limit_middleware};
pub use types::{
    ConnectionJson, ErrorResponse, HealthResponse, StageJson, StagedSubstageJson, SubstageJson,
    ToolJson,
};

use crate::config::{CorsOrigins, ServerConfig};
use axum::{
    Router,
    http::{HeaderValue, Method, StatusCode, header},
    middleware as axum_middleware,
    routing::get,
};
use lifecycle_core::{LifecycleError, Store};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state. Holds only the database location; connections are
/// opened per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

impl AppState {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer. The API is read-only, so only GET is allowed.
fn build_cors_layer(origins: &CorsOrigins) -> CorsLayer {
    match origins {
        CorsOrigins::Any => {
            tracing::warn!(
                "CORS: Allowing ALL origins (LIFECYCLE_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        CorsOrigins::List(list) => {
            let allowed: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", origin);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                read_only_cors(allowed)
            }
        }
        CorsOrigins::Localhost => build_localhost_cors(),
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5000",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5000",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    read_only_cors(origins)
}

fn read_only_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Abort requests that run longer than `limit` with `408 Request Timeout`.
pub fn timeout_layer(limit: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, limit)
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints, the asset fallback, and
/// middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Timeout - bounds every request
/// 4. Rate Limiting - global quota (if enabled)
pub fn create_router(config: &ServerConfig) -> Router {
    let state = AppState::new(Store::new(&config.database));

    let mut router = Router::new()
        .route("/api/health", get(handlers::health_handler))
        .route("/api/lifecycle", get(handlers::lifecycle_handler))
        .route("/api/connections", get(handlers::connections_handler))
        .route("/api/substages/all", get(handlers::all_substages_handler))
        .route("/api/substages/{stage}", get(handlers::substages_handler))
        .route("/api/tools/{stage}", get(handlers::tools_handler))
        .fallback_service(assets::spa_service(&config.static_dir));

    match middleware::create_rate_limiter(config.rate_limit) {
        Some(limiter) => {
            tracing::info!("Rate limiting enabled: {} requests/second", config.rate_limit);
            router = router.layer(axum_middleware::from_fn_with_state(
                limiter,
                middleware::rate_limit_middleware,
            ));
        }
        None => tracing::info!("Rate limiting disabled"),
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(&config.cors_origins))
                .layer(timeout_layer(config.request_timeout)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl+C.
pub async fn run_server(config: &ServerConfig) -> Result<(), LifecycleError> {
    let router = create_router(config);
    let addr = config.addr();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LifecycleError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Lifecycle HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LifecycleError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// =============================================================================
// TESTS
// =============================================================================
