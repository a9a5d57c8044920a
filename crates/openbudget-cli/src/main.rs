//! OpenBudget CLI - Personal finance backend
//!
//! Usage:
//!   openbudget init                        Initialize database
//!   openbudget serve --port 3000           Start the REST API server
//!   openbudget status                      Show record counts
//!   openbudget transactions --start-date 2024-01-01 --end-date 2024-03-31

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Serve { port, host } => commands::cmd_serve(&cli.db, &host, port).await,
        Commands::Status => commands::cmd_status(&cli.db),
        Commands::Categories { filter, json } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_categories(&db, &filter.into(), json)
        }
        Commands::Budgets { filter, json } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_budgets(&db, &filter.into(), json)
        }
        Commands::Transactions { filter, json } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_transactions(&db, &filter.into(), json)
        }
    }
}
