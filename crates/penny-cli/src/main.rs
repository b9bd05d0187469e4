//! Penny CLI - Personal finance client
//!
//! Usage:
//!   penny signup -n Sam -e you@example.com  Create an account
//!   penny login --email you@example.com   Log in and store the session token
//!   penny dashboard                       Totals and recent transactions
//!   penny tx add -c food -d Lunch -a 12   Record a transaction
//!   penny report --half first             Spending by category and month
//!   penny recs                            Savings recommendations
//!   penny recs session                    Interactive apply / ignore / undo

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use penny_core::TransactionInput;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
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
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let config = commands::load_config(cli.config.as_deref())?;
    let store = commands::open_store(cli.db.as_deref())?;

    match cli.command {
        Commands::Signup {
            name,
            email,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => commands::read_password()?,
            };
            let client = commands::build_client(&config, &store)?;
            commands::cmd_signup(&client, &name, &email, &password).await
        }
        Commands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => commands::read_password()?,
            };
            let client = commands::build_client(&config, &store)?;
            commands::cmd_login(&client, &store, &email, &password).await
        }
        Commands::Logout => commands::cmd_logout(&store),
        Commands::Whoami => {
            let client = commands::build_client(&config, &store)?;
            commands::cmd_whoami(&client).await
        }
        Commands::Profile { action } => {
            let client = commands::build_client(&config, &store)?;
            match action {
                None | Some(ProfileAction::Show) => commands::cmd_whoami(&client).await,
                Some(ProfileAction::Update { name, email }) => {
                    commands::cmd_profile_update(&client, name.as_deref(), email.as_deref())
                        .await
                }
                Some(ProfileAction::Password {
                    current,
                    new_password,
                    confirm,
                }) => {
                    let (current, new_password, confirm) = {
                        let mut stdin = std::io::stdin().lock();
                        let mut stdout = std::io::stdout();
                        let mut ask = |given: Option<String>, label: &str| match given {
                            Some(value) => Ok(value),
                            None => commands::prompt_secret(label, &mut stdin, &mut stdout),
                        };
                        (
                            ask(current, "Current password")?,
                            ask(new_password, "New password")?,
                            ask(confirm, "Confirm new password")?,
                        )
                    };
                    commands::cmd_profile_password(&client, &current, &new_password, &confirm)
                        .await
                }
            }
        }
        Commands::Tx { action } => {
            let client = commands::build_client(&config, &store)?;
            match action {
                None => commands::cmd_tx_list(&client, None, None).await,
                Some(TxAction::List { kind, limit }) => {
                    commands::cmd_tx_list(&client, kind, limit).await
                }
                Some(TxAction::Add {
                    date,
                    category,
                    description,
                    amount,
                    kind,
                }) => {
                    let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
                    let input =
                        TransactionInput::new(date, &category, &description, amount, kind)?;
                    commands::cmd_tx_add(&client, &input).await
                }
                Some(TxAction::Edit {
                    id,
                    date,
                    category,
                    description,
                    amount,
                    kind,
                }) => {
                    let edit = commands::TransactionEdit {
                        date,
                        category,
                        description,
                        amount,
                        kind,
                    };
                    commands::cmd_tx_edit(&client, &id, &edit).await
                }
                Some(TxAction::Rm { id }) => commands::cmd_tx_rm(&client, &id).await,
            }
        }
        Commands::Dashboard { recent } => {
            let client = commands::build_client(&config, &store)?;
            commands::cmd_dashboard(&client, recent).await
        }
        Commands::Report { from, to, half } => {
            let today = chrono::Local::now().date_naive();
            let range = commands::report_range(from, to, half, today)?;
            let client = commands::build_client(&config, &store)?;
            commands::cmd_report(&client, range).await
        }
        Commands::Insights => {
            let client = commands::build_client(&config, &store)?;
            commands::cmd_insights(&client).await
        }
        Commands::Recs { action } => {
            let client = commands::build_client(&config, &store)?;
            match action {
                None | Some(RecsAction::List) => commands::cmd_recs_list(store, &client).await,
                Some(RecsAction::Apply { categories }) => {
                    commands::cmd_recs_apply(store, &client, &categories).await
                }
                Some(RecsAction::ApplyAll) => commands::cmd_recs_apply_all(store, &client).await,
                Some(RecsAction::Undo { categories }) => {
                    commands::cmd_recs_undo(store, &client, &categories).await
                }
                Some(RecsAction::Session) => {
                    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                    commands::cmd_recs_session(store, Arc::new(client), stdin).await
                }
                Some(RecsAction::Reset) => commands::cmd_recs_reset(store),
            }
        }
    }
}
