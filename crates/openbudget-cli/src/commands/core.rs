//! Core commands and shared utilities

use std::path::Path;

use anyhow::{Context, Result};
use openbudget_core::Database;
use tracing::debug;

/// Open (or create) the database at `db_path`, applying the schema
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    debug!(path = %path_str, "Opening database");
    Database::new(path_str).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    db.ping().context("Database is not responding")?;

    println!("✅ Database ready");
    println!();
    println!("Next steps:");
    println!("  openbudget serve --port 3000");
    println!("  curl -X POST localhost:3000/categories \\");
    println!("       -H 'content-type: application/json' \\");
    println!("       -d '{{\"name\":\"Food\",\"type\":\"EXPENSE\"}}'");

    Ok(())
}
