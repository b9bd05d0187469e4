//! CLI command tests
//!
//! This module contains all tests for the CLI commands. Network-facing
//! commands run against the mock backend from penny-core's test utilities.

use std::sync::Arc;

use chrono::NaiveDate;
use penny_core::db::Database;
use penny_core::recommendations::{CategoryId, RecommendationWorkflow, SelectionState};
use penny_core::reports::Half;
use penny_core::models::TransactionId;
use penny_core::test_utils::{sample_snapshot, sample_transactions, MockBackend};
use penny_core::{store, ApiClient, MemoryStore, Money, PennyConfig, TransactionKind};

use crate::commands::{self, truncate};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn client_for(server: &MockBackend) -> ApiClient {
    ApiClient::new(&server.url()).with_token(MockBackend::TOKEN)
}

// ========== Utility Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly10!", 10), "exactly10!");
    assert_eq!(truncate("this is a long string", 10), "this is...");
    assert_eq!(truncate("café au lait", 7), "café...");
}

#[test]
fn test_open_store_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("penny.db");

    let db = commands::open_store(Some(&path)).unwrap();
    assert!(path.exists());
    assert_eq!(db.path(), path.display().to_string());
}

#[test]
fn test_build_client_uses_stored_token() {
    let store = MemoryStore::new();
    let config = PennyConfig::default();

    // PENNY_TOKEN would take precedence; only check the store path when unset
    if std::env::var(penny_core::api::TOKEN_ENV).is_err() {
        let client = commands::build_client(&config, &store).unwrap();
        assert!(!client.has_token());

        store::save_token(&store, "stored-token").unwrap();
        let client = commands::build_client(&config, &store).unwrap();
        assert!(client.has_token());
    }
}

// ========== Session Command Tests ==========

#[tokio::test]
async fn test_cmd_login_stores_token() {
    let server = MockBackend::start().await;
    let store = MemoryStore::new();
    let client = ApiClient::new(&server.url());

    commands::cmd_login(&client, &store, MockBackend::EMAIL, MockBackend::PASSWORD)
        .await
        .unwrap();

    assert_eq!(
        store::load_token(&store).unwrap().as_deref(),
        Some(MockBackend::TOKEN)
    );
}

#[tokio::test]
async fn test_cmd_login_rejected() {
    let server = MockBackend::start().await;
    let store = MemoryStore::new();
    let client = ApiClient::new(&server.url());

    let result = commands::cmd_login(&client, &store, MockBackend::EMAIL, "wrong-pass").await;
    assert!(result.is_err());
    assert_eq!(store::load_token(&store).unwrap(), None);

    // Invalid input never reaches the backend
    let result = commands::cmd_login(&client, &store, "not-an-email", "whatever").await;
    assert!(result.is_err());
}

#[test]
fn test_prompt_secret_warns_input_is_visible() {
    let mut input: &[u8] = b"s3cret!\nignored\n";
    let mut output = Vec::new();

    let secret = commands::prompt_secret("Password", &mut input, &mut output).unwrap();
    assert_eq!(secret, "s3cret!");
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "Password (input is visible): "
    );

    let mut empty: &[u8] = b"\n";
    assert!(commands::prompt_secret("Password", &mut empty, &mut Vec::new()).is_err());
}

#[tokio::test]
async fn test_cmd_signup() {
    let server = MockBackend::start().await;
    let client = ApiClient::new(&server.url());

    commands::cmd_signup(&client, "Pat", "pat@example.com", "pat-pass1")
        .await
        .unwrap();

    // Existing email is refused by the backend
    let result = commands::cmd_signup(&client, "Sam", MockBackend::EMAIL, "pat-pass1").await;
    assert!(result.is_err());

    // Blank name is refused locally
    let result = commands::cmd_signup(&client, " ", "new@example.com", "pat-pass1").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cmd_profile_update_keeps_unset_fields() {
    let server = MockBackend::start().await;
    let client = client_for(&server);

    assert!(commands::cmd_profile_update(&client, None, None).await.is_err());

    commands::cmd_profile_update(&client, Some("Sam Spender"), None)
        .await
        .unwrap();
    let me = client.profile().await.unwrap();
    assert_eq!(me.name.as_deref(), Some("Sam Spender"));
    assert_eq!(me.email.as_deref(), Some(MockBackend::EMAIL));

    assert!(commands::cmd_profile_update(&client, None, Some("not-an-email"))
        .await
        .is_err());
}

#[tokio::test]
async fn test_cmd_profile_password() {
    let server = MockBackend::start().await;
    let client = client_for(&server);

    let mismatch =
        commands::cmd_profile_password(&client, MockBackend::PASSWORD, "next-pass", "nxt-pass")
            .await;
    assert!(mismatch.is_err());

    let too_short = commands::cmd_profile_password(&client, MockBackend::PASSWORD, "abc", "abc");
    assert!(too_short.await.is_err());

    commands::cmd_profile_password(&client, MockBackend::PASSWORD, "next-pass", "next-pass")
        .await
        .unwrap();
    let anonymous = ApiClient::new(&server.url());
    assert!(anonymous.login(MockBackend::EMAIL, "next-pass").await.is_ok());
}

#[test]
fn test_cmd_logout() {
    let store = MemoryStore::new();
    assert!(commands::cmd_logout(&store).is_ok());

    store::save_token(&store, "abc").unwrap();
    commands::cmd_logout(&store).unwrap();
    assert_eq!(store::load_token(&store).unwrap(), None);
}

#[tokio::test]
async fn test_cmd_whoami() {
    let server = MockBackend::start().await;
    assert!(commands::cmd_whoami(&client_for(&server)).await.is_ok());

    let anonymous = ApiClient::new(&server.url());
    assert!(commands::cmd_whoami(&anonymous).await.is_err());
}

// ========== View Command Tests ==========

#[tokio::test]
async fn test_cmd_dashboard() {
    let server = MockBackend::start().await;
    let client = client_for(&server);
    assert!(commands::cmd_dashboard(&client, 5).await.is_ok());

    server.set_transactions(Vec::new());
    assert!(commands::cmd_dashboard(&client, 5).await.is_ok());
}

#[tokio::test]
async fn test_cmd_report_and_insights() {
    let server = MockBackend::start().await;
    let client = client_for(&server);

    let range =
        commands::report_range(Some(ymd(2024, 1, 1)), None, None, ymd(2024, 3, 1)).unwrap();
    assert!(commands::cmd_report(&client, range).await.is_ok());
    assert!(commands::cmd_insights(&client).await.is_ok());
}

#[test]
fn test_snapshot_highlights() {
    let lines = commands::snapshot_highlights(&sample_snapshot());
    assert_eq!(
        lines,
        vec![
            "Top expense category: Food".to_string(),
            "Top income source:    Salary".to_string(),
            "⚠️  Food spending is above 20% of income".to_string(),
        ]
    );

    let empty = commands::snapshot_highlights(&Default::default());
    assert!(empty.is_empty());
}

#[test]
fn test_report_range() {
    let today = ymd(2024, 8, 15);

    let ytd = commands::report_range(None, None, None, today).unwrap();
    assert_eq!(ytd.start, ymd(2024, 1, 1));
    assert_eq!(ytd.end, today);

    let h1 = commands::report_range(None, None, Some(Half::First), today).unwrap();
    assert_eq!(h1.start, ymd(2024, 1, 1));
    assert_eq!(h1.end, ymd(2024, 6, 30));

    let from = Some(ymd(2024, 2, 1));
    let custom = commands::report_range(from, Some(ymd(2024, 2, 29)), None, today).unwrap();
    assert_eq!(custom.months().len(), 1);

    assert!(commands::report_range(Some(ymd(2024, 9, 1)), None, None, today).is_err());
}

// ========== Recommendation Command Tests ==========

#[tokio::test]
async fn test_cmd_recs_apply_and_undo() {
    let server = MockBackend::start().await;
    let client = client_for(&server);
    let store = MemoryStore::new();

    commands::cmd_recs_list(store.clone(), &client).await.unwrap();

    commands::cmd_recs_apply(store.clone(), &client, &["food".to_string()])
        .await
        .unwrap();
    let selection = SelectionState::load(&store);
    assert!(selection.contains(&CategoryId::new("Food")));
    assert_eq!(selection.estimated_savings(), Money::from_major(2500.0));

    commands::cmd_recs_undo(store.clone(), &client, &["FOOD".to_string()])
        .await
        .unwrap();
    assert!(SelectionState::load(&store).is_empty());
}

#[tokio::test]
async fn test_cmd_recs_unknown_category_is_noop() {
    let server = MockBackend::start().await;
    let client = client_for(&server);
    let store = MemoryStore::new();

    commands::cmd_recs_apply(store.clone(), &client, &["Rent".to_string()])
        .await
        .unwrap();
    commands::cmd_recs_undo(store.clone(), &client, &["Rent".to_string()])
        .await
        .unwrap();
    assert!(SelectionState::load(&store).is_empty());
}

#[tokio::test]
async fn test_cmd_recs_apply_all_and_reset() {
    let server = MockBackend::start().await;
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("penny.db")).unwrap();

    commands::cmd_recs_apply_all(db.clone(), &client).await.unwrap();
    let workflow = RecommendationWorkflow::load(db.clone());
    assert_eq!(workflow.applied().len(), 2);
    assert_eq!(workflow.estimated_savings(), Money::from_major(2800.0));

    commands::cmd_recs_reset(db.clone()).unwrap();
    assert!(SelectionState::load(&db).is_empty());
}

#[tokio::test]
async fn test_cmd_recs_fetch_failure() {
    let server = MockBackend::start().await;
    server.fail_insights(true);
    let client = client_for(&server);
    let store = MemoryStore::new();

    let result = commands::cmd_recs_apply_all(store.clone(), &client).await;
    assert!(result.is_err());
    assert!(SelectionState::load(&store).is_empty());
}

#[tokio::test]
async fn test_cmd_recs_undo_survives_fetch_failure() {
    let server = MockBackend::start().await;
    let client = client_for(&server);
    let store = MemoryStore::new();

    commands::cmd_recs_apply(store.clone(), &client, &["Food".to_string()])
        .await
        .unwrap();
    assert_eq!(SelectionState::load(&store).len(), 1);

    server.fail_insights(true);
    commands::cmd_recs_undo(store.clone(), &client, &["food".to_string()])
        .await
        .unwrap();

    let selection = SelectionState::load(&store);
    assert!(selection.is_empty());
    assert_eq!(selection.estimated_savings(), Money::ZERO);

    // Listing still needs fresh insights
    assert!(commands::cmd_recs_list(store.clone(), &client).await.is_err());
}

// ========== Transaction Command Tests ==========

#[test]
fn test_parse_transaction_id() {
    assert_eq!(commands::parse_transaction_id(" 42 "), TransactionId::Number(42));
    assert_eq!(
        commands::parse_transaction_id("abc-1"),
        TransactionId::Text("abc-1".to_string())
    );
}

#[test]
fn test_transaction_edit_overlays_existing() {
    let groceries = sample_transactions()
        .into_iter()
        .find(|tx| tx.label() == "Groceries")
        .unwrap();

    let edit = commands::TransactionEdit {
        amount: Some(80.0),
        ..Default::default()
    };
    let input = edit.apply_to(&groceries).unwrap();
    assert_eq!(input.amount, 80.0);
    assert_eq!(input.category, "food");
    assert_eq!(input.description, "Groceries");
    assert_eq!(input.date, "2024-01-05T00:00:00.000Z");
    assert_eq!(input.transaction_type, "EXPENSE");

    // Stored negative amount is sent as its magnitude
    let edit = commands::TransactionEdit {
        kind: Some(TransactionKind::Income),
        ..Default::default()
    };
    let input = edit.apply_to(&groceries).unwrap();
    assert_eq!(input.amount, 1500.0);
    assert_eq!(input.transaction_type, "INCOME");

    let edit = commands::TransactionEdit {
        amount: Some(-3.0),
        ..Default::default()
    };
    assert!(edit.apply_to(&groceries).is_err());
    assert!(commands::TransactionEdit::default().is_empty());
}

#[tokio::test]
async fn test_cmd_tx_add_edit_rm() {
    let server = MockBackend::start().await;
    let client = client_for(&server);
    let before = server.transactions().len();

    let input = penny_core::TransactionInput::new(
        ymd(2024, 3, 9),
        "food",
        "Bakery",
        7.5,
        TransactionKind::Expense,
    )
    .unwrap();
    commands::cmd_tx_add(&client, &input).await.unwrap();
    let added = server
        .transactions()
        .into_iter()
        .find(|tx| tx.label() == "Bakery")
        .unwrap();
    assert_eq!(server.transactions().len(), before + 1);

    let id = added.id.to_string();
    let edit = commands::TransactionEdit {
        category: Some("treats".to_string()),
        ..Default::default()
    };
    commands::cmd_tx_edit(&client, &id, &edit).await.unwrap();
    let edited = server
        .transactions()
        .into_iter()
        .find(|tx| tx.id == added.id)
        .unwrap();
    assert_eq!(edited.category, "treats");
    assert_eq!(edited.amount, 7.5);

    // Empty edits and unknown ids fail without touching the backend
    let nothing = commands::TransactionEdit::default();
    assert!(commands::cmd_tx_edit(&client, &id, &nothing).await.is_err());
    assert!(commands::cmd_tx_edit(&client, "9999", &edit).await.is_err());

    assert!(commands::cmd_tx_list(&client, Some(TransactionKind::Expense), Some(3))
        .await
        .is_ok());

    commands::cmd_tx_rm(&client, &id).await.unwrap();
    assert_eq!(server.transactions().len(), before);
    assert!(commands::cmd_tx_rm(&client, &id).await.is_err());
}

// ========== Interactive Session Tests ==========

#[tokio::test]
async fn test_session_script() {
    let server = MockBackend::start().await;
    let client = Arc::new(client_for(&server));
    let store = MemoryStore::new();

    let script: &[u8] = b"list\napply food\nignore transport\nall\nquit\napply transport\n";
    commands::cmd_recs_session(store.clone(), client, script)
        .await
        .unwrap();

    // Transport was ignored, so `all` had nothing left; lines after quit are unread
    let selection = SelectionState::load(&store);
    assert_eq!(selection.len(), 1);
    assert!(selection.contains(&CategoryId::new("Food")));
    assert_eq!(selection.estimated_savings(), Money::from_major(2500.0));
}

#[tokio::test]
async fn test_session_background_refresh() {
    let server = MockBackend::start().await;
    let client = Arc::new(client_for(&server));
    let store = MemoryStore::new();

    // End of input waits for the in-flight refresh before returning
    let script: &[u8] = b"apply food\nrefresh\n";
    commands::cmd_recs_session(store.clone(), client, script)
        .await
        .unwrap();

    assert_eq!(server.insights_calls(), 2);
    assert!(SelectionState::load(&store).contains(&CategoryId::new("Food")));
}

#[tokio::test]
async fn test_session_survives_fetch_failure() {
    let server = MockBackend::start().await;
    server.fail_insights(true);
    let client = Arc::new(client_for(&server));
    let store = MemoryStore::new();

    let script: &[u8] = b"apply food\nlist\nquit\n";
    let result = commands::cmd_recs_session(store.clone(), client, script).await;

    assert!(result.is_ok());
    assert!(SelectionState::load(&store).is_empty());
}
