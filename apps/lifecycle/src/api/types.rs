//! # API Response Types
//!
//! JSON shapes returned by the HTTP API. Field names here are the wire
//! contract; the storage column names live in `lifecycle-core`.

use lifecycle_core::{Connection, Stage, StagedSubstage, Substage, Tool};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every 500 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// =============================================================================
// LIFECYCLE RESOURCES
// =============================================================================

/// `GET /api/lifecycle` element. `name` repeats `stage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageJson {
    pub stage: Option<String>,
    pub name: Option<String>,
    pub stagedesc: Option<String>,
}

impl From<Stage> for StageJson {
    fn from(stage: Stage) -> Self {
        Self {
            name: stage.stage.clone(),
            stage: stage.stage,
            stagedesc: stage.stagedesc,
        }
    }
}

/// `GET /api/connections` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionJson {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl From<Connection> for ConnectionJson {
    fn from(connection: Connection) -> Self {
        Self {
            from: connection.start,
            to: connection.end,
        }
    }
}

/// `GET /api/substages/{stage}` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstageJson {
    pub name: Option<String>,
    pub description: Option<String>,
    pub exemplar: Option<String>,
}

impl From<Substage> for SubstageJson {
    fn from(substage: Substage) -> Self {
        Self {
            name: substage.substagename,
            description: substage.substagedesc,
            exemplar: substage.exemplar,
        }
    }
}

/// `GET /api/substages/all` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedSubstageJson {
    pub stage: Option<String>,
    pub substagename: Option<String>,
    pub substagedesc: Option<String>,
    pub exemplar: Option<String>,
}

impl From<StagedSubstage> for StagedSubstageJson {
    fn from(row: StagedSubstage) -> Self {
        Self {
            stage: row.stage,
            substagename: row.substage.substagename,
            substagedesc: row.substage.substagedesc,
            exemplar: row.substage.exemplar,
        }
    }
}

/// `GET /api/tools/{stage}` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolJson {
    pub name: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub provider: Option<String>,
}

impl From<Tool> for ToolJson {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name,
            description: tool.description,
            link: tool.link,
            provider: tool.provider,
        }
    }
}
