//! # Store Module
//!
//! Read-only query layer over the lifecycle SQLite file.
//!
//! A `Store` holds nothing but the database path. Every operation opens its
//! own connection, runs one statement with bound parameters, and drops the
//! connection before returning, so a `Store` can be cloned freely across
//! threads without any shared lock.
//!
//! Read connections are opened with `SQLITE_OPEN_READ_ONLY`: a missing file
//! is reported as [`LifecycleError::Connection`] instead of being created
//! empty. Every connection also runs `PRAGMA foreign_keys = OFF`, since the
//! bundled SQLite enforces the declared foreign keys by default.

use crate::schema::{TABLES, disable_foreign_keys, init_schema};
use crate::{Connection, LifecycleError, Stage, StagedSubstage, Substage, TableCount, Tool};
use rusqlite::{OpenFlags, Params, Row};
use std::path::{Path, PathBuf};

/// How many rows [`Store::execute`] should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Every matching row, in storage order.
    All,
    /// At most the first matching row.
    Single,
}

/// Handle to the lifecycle database file.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Create a store for the database at `path`. Nothing is opened yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the database file and schema if absent, then return a store
    /// for it.
    pub fn initialize(path: impl Into<PathBuf>) -> Result<Self, LifecycleError> {
        let store = Self::new(path);
        let conn = rusqlite::Connection::open_with_flags(
            &store.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| LifecycleError::Connection {
            path: store.path.clone(),
            source,
        })?;
        disable_foreign_keys(&conn).map_err(LifecycleError::Schema)?;
        init_schema(&conn)?;
        Ok(store)
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<rusqlite::Connection, LifecycleError> {
        let conn = rusqlite::Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| LifecycleError::Connection {
            path: self.path.clone(),
            source,
        })?;
        disable_foreign_keys(&conn).map_err(LifecycleError::Query)?;
        Ok(conn)
    }

    // =========================================================================
    // GENERIC EXECUTION
    // =========================================================================

    /// Run `sql` with bound `params` and map each row with `map_row`.
    ///
    /// Either every row is mapped or an error is returned; partial results
    /// never escape.
    pub fn execute<T, P, F>(
        &self,
        sql: &str,
        params: P,
        mode: FetchMode,
        mut map_row: F,
    ) -> Result<Vec<T>, LifecycleError>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.open()?;
        let mut stmt = conn.prepare(sql).map_err(LifecycleError::Query)?;
        let mut rows = stmt.query(params).map_err(LifecycleError::Query)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(LifecycleError::Query)? {
            out.push(map_row(row).map_err(LifecycleError::Query)?);
            if mode == FetchMode::Single {
                break;
            }
        }
        Ok(out)
    }

    /// [`Store::execute`] in single mode, unwrapped to an `Option`.
    pub fn fetch_one<T, P, F>(
        &self,
        sql: &str,
        params: P,
        map_row: F,
    ) -> Result<Option<T>, LifecycleError>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        Ok(self
            .execute(sql, params, FetchMode::Single, map_row)?
            .into_iter()
            .next())
    }

    // =========================================================================
    // LIFECYCLE QUERIES
    // =========================================================================

    /// All stages.
    ///
    /// Selecting `stagedesc` alongside `stage` keeps this a table scan in
    /// storage order; `stage` alone is answered from the primary-key index
    /// in key order.
    pub fn stages(&self) -> Result<Vec<Stage>, LifecycleError> {
        self.execute(
            "SELECT stage, stagedesc FROM LifeCycle",
            [],
            FetchMode::All,
            |row| {
                Ok(Stage {
                    stage: row.get("stage")?,
                    stagedesc: row.get("stagedesc")?,
                })
            },
        )
    }

    /// All connections between stages.
    pub fn connections(&self) -> Result<Vec<Connection>, LifecycleError> {
        self.execute(
            r#"SELECT start, "end" FROM CycleConnects"#,
            [],
            FetchMode::All,
            |row| {
                Ok(Connection {
                    start: row.get("start")?,
                    end: row.get("end")?,
                })
            },
        )
    }

    /// Substages whose `stage` column equals `stage`.
    pub fn substages_for(&self, stage: &str) -> Result<Vec<Substage>, LifecycleError> {
        self.execute(
            "SELECT substagename, substagedesc, exemplar FROM SubStage WHERE stage = ?1",
            [stage],
            FetchMode::All,
            map_substage,
        )
    }

    /// Every substage with its stage attribution.
    pub fn all_substages(&self) -> Result<Vec<StagedSubstage>, LifecycleError> {
        self.execute(
            "SELECT stage, substagename, substagedesc, exemplar FROM SubStage",
            [],
            FetchMode::All,
            |row| {
                Ok(StagedSubstage {
                    stage: row.get("stage")?,
                    substage: map_substage(row)?,
                })
            },
        )
    }

    /// Tools whose `stage` column equals `stage`.
    pub fn tools_for(&self, stage: &str) -> Result<Vec<Tool>, LifecycleError> {
        self.execute(
            "SELECT ToolName, ToolDesc, ToolLink, ToolProvider FROM Tools WHERE stage = ?1",
            [stage],
            FetchMode::All,
            |row| {
                Ok(Tool {
                    name: row.get("ToolName")?,
                    description: row.get("ToolDesc")?,
                    link: row.get("ToolLink")?,
                    provider: row.get("ToolProvider")?,
                })
            },
        )
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    /// Lifecycle tables that do not exist in the database.
    pub fn missing_tables(&self) -> Result<Vec<&'static str>, LifecycleError> {
        let present: Vec<String> = self.execute(
            "SELECT name FROM sqlite_master WHERE type = 'table'",
            [],
            FetchMode::All,
            |row| row.get(0),
        )?;
        Ok(TABLES
            .into_iter()
            .filter(|table| !present.iter().any(|name| name.as_str() == *table))
            .collect())
    }

    /// Row count for each lifecycle table.
    pub fn table_counts(&self) -> Result<Vec<TableCount>, LifecycleError> {
        let missing = self.missing_tables()?;
        let mut counts = Vec::with_capacity(TABLES.len());

        for table in TABLES {
            let rows = if missing.contains(&table) {
                None
            } else {
                // Table names come from TABLES, never from the caller.
                let sql = format!("SELECT COUNT(*) FROM {table}");
                self.fetch_one(&sql, [], |row| row.get::<_, i64>(0))?
                    .map(|n| n as u64)
            };
            counts.push(TableCount {
                table: table.to_string(),
                rows,
            });
        }
        Ok(counts)
    }
}

fn map_substage(row: &Row<'_>) -> rusqlite::Result<Substage> {
    Ok(Substage {
        substagename: row.get("substagename")?,
        substagedesc: row.get("substagedesc")?,
        exemplar: row.get("exemplar")?,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seeded_store() -> (Store, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        let store = Store::initialize(dir.path().join("lifecycle.db")).expect("init");

        let conn = rusqlite::Connection::open(store.path()).expect("open");
        disable_foreign_keys(&conn).expect("pragma");
        conn.execute_batch(
            r#"
            INSERT INTO LifeCycle (stage, stagedesc) VALUES ('Plan', 'Planning phase');
            INSERT INTO LifeCycle (stage, stagedesc) VALUES ('Collect', 'Collection phase');
            INSERT INTO CycleConnects (start, "end", type) VALUES ('Plan', 'Collect', 'normal');
            INSERT INTO SubStage VALUES ('DMP', 'Write a plan', 'DMPonline', 'Plan');
            INSERT INTO SubStage VALUES ('Ethics', 'Get approval', NULL, 'Plan');
            INSERT INTO SubStage VALUES ('Survey', 'Run a survey', 'Qualtrics', 'Collect');
            INSERT INTO Tools VALUES ('DMPonline', 'Plan writer', 'https://dmponline.dcc.ac.uk', 'DCC', 'Plan');
            "#,
        )
        .expect("seed");
        (store, dir)
    }

    #[test]
    fn stages_in_insertion_order() {
        let (store, _dir) = seeded_store();
        let stages = store.stages().expect("stages");
        let names: Vec<_> = stages.iter().filter_map(|s| s.stage.as_deref()).collect();
        assert_eq!(names, vec!["Plan", "Collect"]);
        assert_eq!(stages[0].stagedesc.as_deref(), Some("Planning phase"));
    }

    #[test]
    fn connections_read_start_and_end() {
        let (store, _dir) = seeded_store();
        let connections = store.connections().expect("connections");
        assert_eq!(
            connections,
            vec![Connection {
                start: Some("Plan".to_string()),
                end: Some("Collect".to_string()),
            }]
        );
    }

    #[test]
    fn substages_filter_by_stage() {
        let (store, _dir) = seeded_store();
        let plan = store.substages_for("Plan").expect("substages");
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].substagename.as_deref(), Some("DMP"));
        assert_eq!(plan[1].exemplar, None);

        assert!(store.substages_for("Archive").expect("substages").is_empty());
    }

    #[test]
    fn all_substages_carry_stage() {
        let (store, _dir) = seeded_store();
        let all = store.all_substages().expect("all");
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].stage.as_deref(), Some("Collect"));
        assert_eq!(all[2].substage.substagename.as_deref(), Some("Survey"));
    }

    #[test]
    fn tools_filter_by_stage() {
        let (store, _dir) = seeded_store();
        let tools = store.tools_for("Plan").expect("tools");
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].provider.as_deref(), Some("DCC"));
        assert!(store.tools_for("Collect").expect("tools").is_empty());
    }

    #[test]
    fn single_mode_returns_at_most_one_row() {
        let (store, _dir) = seeded_store();
        let rows: Vec<String> = store
            .execute(
                "SELECT stage, stagedesc FROM LifeCycle",
                [],
                FetchMode::Single,
                |row| row.get("stage"),
            )
            .expect("execute");
        assert_eq!(rows, vec!["Plan".to_string()]);

        let none: Option<String> = store
            .fetch_one(
                "SELECT stage FROM LifeCycle WHERE stage = ?1",
                ["Analyse"],
                |row| row.get(0),
            )
            .expect("fetch_one");
        assert_eq!(none, None);
    }

    #[test]
    fn orphaned_rows_read_back_through_the_store() {
        let (store, _dir) = seeded_store();
        {
            let conn = rusqlite::Connection::open(store.path()).expect("open");
            disable_foreign_keys(&conn).expect("pragma");
            conn.execute_batch(
                r#"
                INSERT INTO SubStage VALUES ('Shred', 'Destroy copies', NULL, 'Retired');
                INSERT INTO Tools VALUES ('Shredder', NULL, NULL, NULL, 'Retired');
                "#,
            )
            .expect("orphans insert");
        }

        let substages = store.substages_for("Retired").expect("substages");
        assert_eq!(substages.len(), 1);
        assert_eq!(substages[0].substagename.as_deref(), Some("Shred"));
        assert_eq!(store.tools_for("Retired").expect("tools").len(), 1);
        assert!(
            store
                .all_substages()
                .expect("all")
                .iter()
                .any(|s| s.stage.as_deref() == Some("Retired"))
        );
    }

    #[test]
    fn store_connections_do_not_enforce_foreign_keys() {
        let (store, _dir) = seeded_store();
        let enabled: Option<i64> = store
            .fetch_one("PRAGMA foreign_keys", [], |row| row.get(0))
            .expect("pragma");
        assert_eq!(enabled, Some(0));
    }

    #[test]
    fn missing_file_is_a_connection_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("absent.db");
        let store = Store::new(&path);

        let err = store.stages().expect_err("should fail");
        assert!(matches!(err, LifecycleError::Connection { .. }));
        assert!(!path.exists(), "read path must not create the database");
    }

    #[test]
    fn malformed_query_is_a_query_error() {
        let (store, _dir) = seeded_store();
        let err = store
            .execute("SELECT nope FROM Nowhere", [], FetchMode::All, |row| {
                row.get::<_, String>(0)
            })
            .expect_err("should fail");
        assert!(matches!(err, LifecycleError::Query(_)));
    }

    #[test]
    fn table_counts_report_missing_tables() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("partial.db");
        {
            let conn = rusqlite::Connection::open(&path).expect("open");
            conn.execute_batch("CREATE TABLE LifeCycle (stage TEXT PRIMARY KEY, stagedesc TEXT);")
                .expect("create");
        }

        let store = Store::new(&path);
        assert_eq!(
            store.missing_tables().expect("missing"),
            vec!["CycleConnects", "SubStage", "Tools"]
        );

        let counts = store.table_counts().expect("counts");
        let lifecycle = counts.iter().find(|c| c.table == "LifeCycle").expect("row");
        assert_eq!(lifecycle.rows, Some(0));
        let tools = counts.iter().find(|c| c.table == "Tools").expect("row");
        assert_eq!(tools.rows, None);
    }

    #[test]
    fn table_counts_on_seeded_store() {
        let (store, _dir) = seeded_store();
        let counts = store.table_counts().expect("counts");
        let rows: Vec<_> = counts.iter().map(|c| (c.table.as_str(), c.rows)).collect();
        assert_eq!(
            rows,
            vec![
                ("CycleConnects", Some(1)),
                ("LifeCycle", Some(2)),
                ("SubStage", Some(3)),
                ("Tools", Some(1)),
            ]
        );
    }
}
