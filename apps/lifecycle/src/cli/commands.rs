//! # CLI Command Implementations

use crate::api;
use crate::config::{HostingProfile, ServerConfig};
use lifecycle_core::{LifecycleError, Store, TableCount};

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    config: &ServerConfig,
    init: bool,
    verbose: bool,
) -> Result<(), LifecycleError> {
    if init {
        // A failed setup must not fall through to serving a partial schema.
        Store::initialize(&config.database)?;
        tracing::info!("Schema ready in {:?}", config.database);
    } else if !config.database.exists() {
        tracing::warn!(
            "Database {:?} does not exist; API requests will fail until it is created",
            config.database
        );
    }

    match config.profile {
        HostingProfile::Hosted => tracing::info!("Running in hosted mode..."),
        HostingProfile::Local => tracing::info!("Running locally..."),
    }

    println!("Lifecycle API Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", config.host);
    println!("  Port:       {}", config.port);
    println!("  Database:   {:?}", config.database);
    println!("  Assets:     {:?}", config.static_dir);
    if verbose {
        println!("  Timeout:    {}s", config.request_timeout.as_secs());
        println!("  Rate limit: {} req/s", config.rate_limit);
        println!("  CORS:       {:?}", config.cors_origins);
    }
    println!();
    println!("Endpoints:");
    println!("  GET /api/lifecycle         - Lifecycle stages");
    println!("  GET /api/connections       - Stage connections");
    println!("  GET /api/substages/all     - All substages");
    println!("  GET /api/substages/<stage> - Substages of a stage");
    println!("  GET /api/tools/<stage>     - Tools of a stage");
    println!("  GET /api/health            - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(config).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create the lifecycle schema.
pub fn cmd_init(config: &ServerConfig, json_mode: bool) -> Result<(), LifecycleError> {
    let store = Store::initialize(&config.database)?;
    let counts = store.table_counts()?;

    if json_mode {
        let output = serde_json::json!({
            "database": config.database.to_string_lossy(),
            "initialized": true,
            "tables": counts,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Initialized lifecycle schema in {:?}", config.database);
    for count in &counts {
        println!("  {}", count.table);
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show row counts for each table.
pub fn cmd_status(config: &ServerConfig, json_mode: bool) -> Result<(), LifecycleError> {
    let store = Store::new(&config.database);
    let counts = store.table_counts()?;

    if json_mode {
        let output = serde_json::json!({
            "database": config.database.to_string_lossy(),
            "tables": counts,
            "missing": missing(&counts),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Lifecycle Database Status");
    println!("=========================");
    println!("Database: {:?}", config.database);
    println!();
    for count in &counts {
        match count.rows {
            Some(rows) => println!("{:<14} {}", count.table, rows),
            None => println!("{:<14} (missing)", count.table),
        }
    }

    let missing = missing(&counts);
    if !missing.is_empty() {
        println!();
        println!(
            "Missing tables: {}. Run `lifecycle init` to create them.",
            missing.join(", ")
        );
    }
    Ok(())
}

fn missing(counts: &[TableCount]) -> Vec<&str> {
    counts
        .iter()
        .filter(|c| c.rows.is_none())
        .map(|c| c.table.as_str())
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
