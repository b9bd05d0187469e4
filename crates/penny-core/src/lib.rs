//! Penny Core Library
//!
//! Shared functionality for the Penny personal finance client:
//! - Backend API client (auth, insights, transactions)
//! - Recommendation workflow (derive, apply, ignore, undo, refresh)
//! - Local key-value store (SQLite) for selection state and session token
//! - Client configuration
//! - Dashboard and spending report aggregation

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod recommendations;
pub mod reports;
pub mod store;

/// Test utilities including a mock finance backend
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use api::ApiClient;
pub use config::PennyConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use models::{
    InsightsSnapshot, Money, Transaction, TransactionId, TransactionInput, TransactionKind,
};
pub use recommendations::{
    CategoryId, HintLevel, Impact, InsightsSource, Recommendation, RecommendationWorkflow,
    RefreshOutcome, SelectionState,
};
pub use reports::{DashboardSummary, DateRange, SpendingReport};
pub use store::{KeyValueStore, MemoryStore};
