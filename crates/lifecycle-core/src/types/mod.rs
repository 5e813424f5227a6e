//! # Types Module
//!
//! Record types for the lifecycle dataset and the crate error type.
//!
//! SQLite accepts NULL in every column here, the `LifeCycle.stage` text
//! primary key included, so records carry `Option<String>` and a NULL cell
//! is passed through instead of failing the read.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// RECORDS
// =============================================================================

/// One phase of the lifecycle (`LifeCycle` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub stage: Option<String>,
    pub stagedesc: Option<String>,
}

/// A directed edge between two stage identifiers (`CycleConnects` table).
///
/// `start` and `end` reference `LifeCycle.stage` by value only.
/// The `type` column is not read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// A substage read through a stage filter, so the stage itself is implied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substage {
    pub substagename: Option<String>,
    pub substagedesc: Option<String>,
    pub exemplar: Option<String>,
}

/// A substage read from the unfiltered listing, carrying its stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedSubstage {
    pub stage: Option<String>,
    pub substage: Substage,
}

/// An external resource associated with a stage (`Tools` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub name: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub provider: Option<String>,
}

/// Row count of one table, `None` when the table does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCount {
    pub table: String,
    pub rows: Option<u64>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in lifecycle operations.
///
/// `Connection` and `Query` are both storage failures and are reported to
/// HTTP clients the same way; they stay separate for logging.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The database file could not be opened (missing, locked, corrupt).
    #[error("Storage error: cannot open {}: {}", .path.display(), .source)]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement failed to prepare, bind, step, or map a row.
    #[error("Storage error: {0}")]
    Query(#[source] rusqlite::Error),

    /// Schema creation failed.
    #[error("Schema error: {0}")]
    Schema(#[source] rusqlite::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LifecycleError {
    /// Whether the error came from the storage layer.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Query(_) | Self::Schema(_)
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_classified() {
        let err = LifecycleError::Query(rusqlite::Error::InvalidQuery);
        assert!(err.is_storage());
        assert!(err.to_string().starts_with("Storage error"));

        let err = LifecycleError::Config("bad port".to_string());
        assert!(!err.is_storage());
    }

    #[test]
    fn connection_error_names_the_path() {
        let err = LifecycleError::Connection {
            path: PathBuf::from("/nowhere/lifecycle.db"),
            source: rusqlite::Error::InvalidPath(PathBuf::from("/nowhere/lifecycle.db")),
        };
        assert!(err.to_string().contains("/nowhere/lifecycle.db"));
        assert!(err.is_storage());
    }
}
