//! # Lifecycle CLI Module
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Create the schema in the database (idempotent)
//! - `status` - Show table row counts

mod commands;

use clap::{Parser, Subcommand};
use lifecycle_core::LifecycleError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Research data lifecycle API
///
/// Serves lifecycle stages, connections, substages, and tools from a
/// SQLite database, plus the front-end bundle.
#[derive(Parser, Debug)]
#[command(name = "lifecycle")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the SQLite database (overrides DB_PATH)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Optional TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (default depends on the hosting profile)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (default depends on the hosting profile)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory holding the pre-built front-end bundle
        #[arg(short, long)]
        static_dir: Option<PathBuf>,

        /// Create the schema before serving
        #[arg(long)]
        init: bool,
    },

    /// Create the lifecycle tables if they do not exist
    Init,

    /// Show row counts for each lifecycle table
    Status,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), LifecycleError> {
    let mut overrides = crate::config::Overrides {
        database: cli.database,
        ..Default::default()
    };

    match cli.command {
        Some(Commands::Server {
            host,
            port,
            static_dir,
            init,
        }) => {
            overrides.host = host;
            overrides.port = port;
            overrides.static_dir = static_dir;
            let config = crate::config::ServerConfig::load(cli.config.as_deref(), overrides)?;
            cmd_server(&config, init, cli.verbose).await
        }
        Some(Commands::Init) => {
            let config = crate::config::ServerConfig::load(cli.config.as_deref(), overrides)?;
            cmd_init(&config, cli.json_mode)
        }
        Some(Commands::Status) => {
            let config = crate::config::ServerConfig::load(cli.config.as_deref(), overrides)?;
            cmd_status(&config, cli.json_mode)
        }
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    }
}
