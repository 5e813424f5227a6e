//! # API Errors
//!
//! Storage failures are caught at the handler boundary, logged, and turned
//! into `500 {"error": "..."}`. No handler ever returns partial data.

use super::types::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lifecycle_core::LifecycleError;
use tokio::task::JoinError;

/// Error returned by a resource handler.
#[derive(Debug)]
pub struct ApiError {
    /// What the handler was doing, for the log line.
    context: &'static str,
    message: String,
}

impl ApiError {
    pub fn storage(context: &'static str, err: LifecycleError) -> Self {
        Self {
            context,
            message: err.to_string(),
        }
    }

    /// The blocking query task panicked or was cancelled.
    pub fn task(context: &'static str, err: JoinError) -> Self {
        Self {
            context,
            message: format!("Query task failed: {}", err),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("Error retrieving {}: {}", self.context, self.message);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

// =============================================================================
// TESTS
// =============================================================================
