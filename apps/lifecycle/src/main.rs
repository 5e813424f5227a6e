//! # Lifecycle - Research Data Lifecycle API
//!
//! The main binary for the lifecycle dataset service.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 apps/lifecycle (THE BINARY)             │
//! │                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐  │
//! │  │   CLI       │    │   HTTP API  │    │   Assets    │  │
//! │  │  (clap)     │    │   (axum)    │    │ (ServeDir)  │  │
//! │  └──────┬──────┘    └──────┬──────┘    └─────────────┘  │
//! │         │                  │                            │
//! │         └────────┬─────────┘                            │
//! │                  ▼                                      │
//! │          ┌────────────────┐                             │
//! │          │ lifecycle-core │                             │
//! │          │   (THE DATA)   │                             │
//! │          └────────────────┘                             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Create the schema, then serve
//! lifecycle init
//! lifecycle server --static-dir build
//!
//! # Inspect the database
//! DB_PATH=/data/lifecycle.db lifecycle status --json-mode
//! ```

use clap::Parser;
use lifecycle::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // LIFECYCLE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("LIFECYCLE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lifecycle=info,lifecycle_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  Research Data Lifecycle API v{}

  Plan • Collect • Analyse • Preserve • Share
"#,
        env!("CARGO_PKG_VERSION")
    );
}
