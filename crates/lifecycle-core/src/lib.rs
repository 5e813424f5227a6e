//! # lifecycle-core
//!
//! Schema and read-only query layer for the research data lifecycle
//! dataset - THE DATA.
//!
//! The dataset is four SQLite tables: lifecycle stages, directed
//! connections between stages, substages, and tools. Rows are bulk-loaded
//! out of band; this crate only creates the schema and reads.
//!
//! ## Architectural Constraints
//!
//! - NO async, NO network dependencies (pure Rust over rusqlite)
//! - Every query binds its parameters; stage identifiers are untrusted
//! - One short-lived connection per operation, nothing shared
//! - Soft references: `stage` columns are matched by value, orphans are kept

// =============================================================================
// MODULES
// =============================================================================

pub mod schema;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use schema::{TABLES, disable_foreign_keys, init_schema};
pub use store::{FetchMode, Store};
pub use types::{
    Connection, LifecycleError, Stage, StagedSubstage, Substage, TableCount, Tool,
};
