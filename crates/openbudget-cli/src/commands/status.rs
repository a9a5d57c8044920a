//! Status command implementation

use std::path::Path;

use anyhow::Result;

use super::open_db;

pub fn cmd_status(db_path: &Path) -> Result<()> {
    println!();
    println!("📊 OpenBudget Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Database: {}", db_path.display());

    if !db_path.exists() {
        println!("   Size: (database not initialized)");
        println!();
        println!("   Run 'openbudget init' to create it.");
        return Ok(());
    }

    if let Ok(metadata) = std::fs::metadata(db_path) {
        let size_kb = metadata.len() as f64 / 1024.0;
        if size_kb < 1024.0 {
            println!("   Size: {:.1} KB", size_kb);
        } else {
            println!("   Size: {:.1} MB", size_kb / 1024.0);
        }
    }

    match open_db(db_path).and_then(|db| db.stats().map_err(Into::into)) {
        Ok(stats) => {
            println!();
            println!("   Categories: {}", stats.categories);
            println!("   Budgets: {}", stats.budgets);
            println!("   Transactions: {}", stats.transactions);
        }
        Err(e) => {
            println!();
            println!("   ❌ Error reading database: {:#}", e);
        }
    }

    Ok(())
}
