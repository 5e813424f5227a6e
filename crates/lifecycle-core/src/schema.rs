//! # Schema Module
//!
//! DDL for the four lifecycle tables.
//!
//! Every statement is `CREATE TABLE IF NOT EXISTS`, so initialization can be
//! repeated or raced by several processes. The `FOREIGN KEY` clauses are
//! declarative only. The bundled SQLite build enforces foreign keys by
//! default, so every connection the store opens switches enforcement off
//! with [`disable_foreign_keys`]. Orphaned rows are valid.

use crate::LifecycleError;
use rusqlite::Connection;

/// Names of the tables created by [`init_schema`].
pub const TABLES: [&str; 4] = ["CycleConnects", "LifeCycle", "SubStage", "Tools"];

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS CycleConnects (
    id INTEGER PRIMARY KEY,
    start TEXT,
    "end" TEXT,
    type TEXT
);

CREATE TABLE IF NOT EXISTS LifeCycle (
    stage TEXT PRIMARY KEY,
    stagedesc TEXT
);

CREATE TABLE IF NOT EXISTS SubStage (
    substagename TEXT,
    substagedesc TEXT,
    exemplar TEXT,
    stage TEXT,
    FOREIGN KEY (stage) REFERENCES LifeCycle(stage)
);

CREATE TABLE IF NOT EXISTS Tools (
    ToolName TEXT,
    ToolDesc TEXT,
    ToolLink TEXT,
    ToolProvider TEXT,
    stage TEXT,
    FOREIGN KEY (stage) REFERENCES LifeCycle(stage)
);
"#;

/// Create the lifecycle tables if they are absent.
pub fn init_schema(conn: &Connection) -> Result<(), LifecycleError> {
    conn.execute_batch(SCHEMA_SQL).map_err(LifecycleError::Schema)
}

/// Turn off foreign-key enforcement for this connection.
///
/// Stage references in `SubStage` and `Tools` are soft: rows naming a stage
/// that `LifeCycle` lacks must load and read back unchanged.
pub fn disable_foreign_keys(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", false)
}

// =============================================================================
// TESTS
// =============================================================================
