//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use penny_core::reports::Half;
use penny_core::TransactionKind;

/// Penny - Spend less, save more
#[derive(Parser)]
#[command(name = "penny")]
#[command(about = "Personal finance client with savings recommendations", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Local store path (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file path (defaults to <data dir>/penny/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account on the backend
    Signup {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (falls back to PENNY_PASSWORD, then a prompt that echoes input)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log in and store the session token
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (falls back to PENNY_PASSWORD, then a prompt that echoes input)
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session token
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Show or change the account profile
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },

    /// List, add, edit and remove transactions
    Tx {
        #[command(subcommand)]
        action: Option<TxAction>,
    },

    /// Show income, expenses, balance and recent transactions
    Dashboard {
        /// Number of recent transactions to show
        #[arg(long, default_value = "5")]
        recent: usize,
    },

    /// Spending by category and month over a date range
    Report {
        /// Start date (YYYY-MM-DD), defaults to Jan 1 of this year
        #[arg(long, conflicts_with = "half")]
        from: Option<NaiveDate>,

        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long, conflicts_with = "half")]
        to: Option<NaiveDate>,

        /// Half of the current year: first or second
        #[arg(long)]
        half: Option<Half>,
    },

    /// Show the backend's insights summary
    Insights,

    /// Savings recommendations (list, apply, apply-all, undo, session, reset)
    Recs {
        #[command(subcommand)]
        action: Option<RecsAction>,
    },
}

#[derive(Subcommand)]
pub enum RecsAction {
    /// Show pending and applied recommendations
    List,

    /// Apply recommendations by category
    Apply {
        /// Category names (case-insensitive)
        #[arg(required = true)]
        categories: Vec<String>,
    },

    /// Apply every pending recommendation
    ApplyAll,

    /// Move applied recommendations back to pending
    Undo {
        /// Category names (case-insensitive)
        #[arg(required = true)]
        categories: Vec<String>,
    },

    /// Interactive session with background refreshes
    Session,

    /// Clear applied recommendations and the savings total
    Reset,
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show name and email
    Show,

    /// Change name and/or email
    Update {
        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New email
        #[arg(long)]
        email: Option<String>,
    },

    /// Change the password (prompts for anything not given; input is visible)
    Password {
        /// Current password
        #[arg(long)]
        current: Option<String>,

        /// New password, at least 6 characters
        #[arg(long = "new")]
        new_password: Option<String>,

        /// Repeat of the new password
        #[arg(long)]
        confirm: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TxAction {
    /// List transactions, newest first
    List {
        /// Only INCOME or EXPENSE
        #[arg(long)]
        kind: Option<TransactionKind>,

        /// Show at most this many
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Record a transaction
    Add {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Category, e.g. food
        #[arg(short, long)]
        category: String,

        /// What it was for
        #[arg(short, long)]
        description: String,

        /// Amount in major units, greater than 0
        #[arg(short, long)]
        amount: f64,

        /// INCOME or EXPENSE
        #[arg(short, long, default_value = "expense")]
        kind: TransactionKind,
    },

    /// Change fields of an existing transaction
    Edit {
        /// Transaction id, as shown by `penny tx list`
        id: String,

        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        amount: Option<f64>,

        #[arg(short, long)]
        kind: Option<TransactionKind>,
    },

    /// Delete a transaction
    Rm {
        /// Transaction id, as shown by `penny tx list`
        id: String,
    },
}
