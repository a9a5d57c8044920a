//! Server command implementation

use std::path::Path;

use anyhow::Result;

use super::open_db;

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16) -> Result<()> {
    let config = openbudget_server::ServerConfig::from_env();

    println!("🚀 Starting OpenBudget API server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if config.allowed_origins.is_empty() {
        println!("   CORS: same-origin only");
    } else {
        println!(
            "   CORS: {} ({})",
            config.allowed_origins.join(", "),
            openbudget_server::ALLOWED_ORIGINS_ENV
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path)?;

    openbudget_server::serve(db, host, port, config).await
}
