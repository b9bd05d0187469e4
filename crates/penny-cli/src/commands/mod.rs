//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `auth` - Account commands (signup, login, logout, whoami, profile)
//! - `core` - Shared utilities (open_store, load_config, build_client)
//! - `dashboard` - Read-only views (dashboard, report, insights)
//! - `recommendations` - Recommendation commands and the interactive session
//! - `transactions` - Transaction list, add, edit and rm

pub mod auth;
pub mod core;
pub mod dashboard;
pub mod recommendations;
pub mod transactions;

// Re-export command functions for main.rs
pub use auth::*;
pub use core::*;
pub use dashboard::*;
pub use recommendations::*;
pub use transactions::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
