//! # Stockroom Scan Station
//!
//! Entry point of the `stockroom` binary.
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Station                                │
//! │                                                                         │
//! │  main.rs ────► logging, config, database, dispatch                      │
//! │                                                                         │
//! │  cli.rs ─────► clap definitions                                         │
//! │                                                                         │
//! │  console.rs ─► `scan`: ScanSession + keyboard-wedge engine on stdin     │
//! │                                                                         │
//! │  commands/ ──► products, low-stock, summary                             │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         SQLite Database                          │  │
//! │  │  stockroom.db (local file, WAL mode)                             │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging to stderr)
//! 2. Parse the command line
//! 3. Load `StationConfig` (defaults → station.toml → environment)
//! 4. Connect to the database and run migrations
//! 5. Run the subcommand

mod cli;
mod commands;
mod config;
mod console;
mod error;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use stockroom_db::{Database, DbConfig};
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::StationConfig;
use crate::console::Console;
use crate::error::StationResult;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> StationResult<()> {
    let config = StationConfig::load(cli.config)?;
    let db_path = config.database_path(cli.db)?;

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let repo = db.products();
    info!(path = %db_path.display(), "Catalog opened");

    let mut stdout = std::io::stdout();
    let result = match &cli.command {
        Command::Scan => {
            let (session, input) = console::wedge_session(&config, Arc::new(repo.clone()));
            let reader = BufReader::new(tokio::io::stdin());
            Console::new(reader, stdout, session, input)
                .low_stock_threshold(config.inventory.low_stock_threshold)
                .run()
                .await
        }
        Command::Products(command) => {
            commands::run_products(&repo, command, &config, &mut stdout).await
        }
        Command::LowStock { threshold } => {
            let threshold = threshold.unwrap_or(config.inventory.low_stock_threshold);
            commands::products::low_stock(&repo, threshold, &mut stdout).await
        }
        Command::Summary => {
            commands::products::summary(&repo, config.inventory.low_stock_threshold, &mut stdout)
                .await
        }
    };

    db.close().await;
    result
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stockroom=trace` - Show trace for stockroom crates only
/// - Default: INFO, DEBUG for stockroom crates
///
/// Logs go to stderr so they do not mix with console output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockroom=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
