//! # API Endpoint Handlers
//!
//! Each resource handler runs one query on the blocking pool and maps the
//! rows to a JSON array, keeping storage order.
//!
//! Stage segments are percent-decoded lossily: bytes that are not UTF-8
//! become U+FFFD, so every segment is a lookup key and never a 400.

use super::{
    AppState,
    error::ApiError,
    types::{
        ConnectionJson, HealthResponse, StageJson, StagedSubstageJson, SubstageJson, ToolJson,
    },
};
use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::request::Parts,
    response::IntoResponse,
};
use lifecycle_core::{LifecycleError, Store};
use std::convert::Infallible;

/// Run a store operation on the blocking pool with a fresh connection.
async fn run_query<T, F>(
    state: &AppState,
    context: &'static str,
    query: F,
) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Store) -> Result<T, LifecycleError> + Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || query(&store))
        .await
        .map_err(|e| ApiError::task(context, e))?
        .map_err(|e| ApiError::storage(context, e))
}

// =============================================================================
// STAGE EXTRACTOR
// =============================================================================

/// The final path segment of a `/{stage}` route, decoded lossily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSegment(pub String);

impl<S> FromRequestParts<S> for StageSegment
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts.uri.path().rsplit('/').next().unwrap_or_default();
        Ok(Self(percent_decode_lossy(raw)))
    }
}

/// Decode `%XX` escapes, keeping malformed escapes literally.
fn percent_decode_lossy(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(&[high, low]) = bytes.get(i + 1..i + 3)
            && let (Some(high), Some(low)) = (hex_value(high), hex_value(low))
        {
            out.push(((high << 4) | low) as u8);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u32> {
    (byte as char).to_digit(16)
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// LIFECYCLE HANDLERS
// =============================================================================

/// List every stage.
pub async fn lifecycle_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<StageJson>>, ApiError> {
    let stages = run_query(&state, "lifecycle data", |store| store.stages()).await?;
    Ok(Json(stages.into_iter().map(StageJson::from).collect()))
}

/// List every connection between stages.
pub async fn connections_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConnectionJson>>, ApiError> {
    let connections =
        run_query(&state, "connections data", |store| store.connections()).await?;
    Ok(Json(
        connections.into_iter().map(ConnectionJson::from).collect(),
    ))
}

/// List the substages of one stage. Unknown stages yield `[]`.
pub async fn substages_handler(
    State(state): State<AppState>,
    StageSegment(stage): StageSegment,
) -> Result<Json<Vec<SubstageJson>>, ApiError> {
    let substages = run_query(&state, "substages data", move |store| {
        store.substages_for(&stage)
    })
    .await?;
    Ok(Json(substages.into_iter().map(SubstageJson::from).collect()))
}

/// List every substage with its stage.
pub async fn all_substages_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<StagedSubstageJson>>, ApiError> {
    let substages =
        run_query(&state, "all substages data", |store| store.all_substages()).await?;
    Ok(Json(
        substages
            .into_iter()
            .map(StagedSubstageJson::from)
            .collect(),
    ))
}

/// List the tools of one stage. Unknown stages yield `[]`.
pub async fn tools_handler(
    State(state): State<AppState>,
    StageSegment(stage): StageSegment,
) -> Result<Json<Vec<ToolJson>>, ApiError> {
    let tools = run_query(&state, "tools data", move |store| store.tools_for(&stage)).await?;
    Ok(Json(tools.into_iter().map(ToolJson::from).collect()))
}

// =============================================================================
// TESTS
// =============================================================================
