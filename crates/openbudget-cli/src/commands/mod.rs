//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Database setup (init) and shared utilities (open_db)
//! - `listing` - Category, budget and transaction listings
//! - `serve` - Web server command
//! - `status` - Database status and record counts

pub mod core;
pub mod listing;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use core::*;
pub use listing::*;
pub use serve::*;
pub use status::*;

/// Shorten text for table output, marking the cut with "..."
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
