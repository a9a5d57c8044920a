//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use openbudget_core::FilterParams;

/// OpenBudget - Track categories, budgets and transactions
#[derive(Parser)]
#[command(name = "openbudget")]
#[command(about = "Personal finance backend: categories, budgets and transactions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, env = "OPENBUDGET_DB", default_value = "openbudget.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Show database status and record counts
    Status,

    /// List categories
    Categories {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List budgets (newest start date first)
    Budgets {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List transactions (newest first)
    Transactions {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// List filters, mirroring the HTTP query parameters.
///
/// Values are passed through as text and parsed by the same filter code the
/// server uses; flags a resource does not understand are ignored.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Entry type (EXPENSE or INCOME)
    #[arg(long = "type")]
    pub entry_type: Option<String>,

    /// Only entries in this category
    #[arg(long)]
    pub category_id: Option<String>,

    /// Only transactions in this budget
    #[arg(long)]
    pub budget_id: Option<String>,

    /// Lower date bound (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Upper date bound (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Only recurring (true) or one-off (false) transactions
    #[arg(long)]
    pub is_recurring: Option<String>,
}

impl From<FilterArgs> for FilterParams {
    fn from(args: FilterArgs) -> Self {
        FilterParams {
            entry_type: args.entry_type,
            category_id: args.category_id,
            budget_id: args.budget_id,
            start_date: args.start_date,
            end_date: args.end_date,
            is_recurring: args.is_recurring,
        }
    }
}
