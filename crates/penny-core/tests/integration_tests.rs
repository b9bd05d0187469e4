//! Integration tests for penny-core
//!
//! These tests exercise the full login -> refresh -> apply -> reload workflow
//! against the mock backend and an on-disk store.

use penny_core::{
    api::ApiClient,
    db::Database,
    models::Money,
    recommendations::{CategoryId, RecommendationWorkflow, RefreshOutcome},
    store,
    test_utils::{sample_snapshot, MockBackend},
    Error, InsightsSnapshot,
};

async fn logged_in_client(server: &MockBackend) -> ApiClient {
    let client = ApiClient::new(&server.url());
    let login = client
        .login(MockBackend::EMAIL, MockBackend::PASSWORD)
        .await
        .expect("login should succeed");
    client.with_token(login.token.expect("token"))
}

// =============================================================================
// Workflow Integration Tests
// =============================================================================

#[tokio::test]
async fn test_full_recommendation_workflow() {
    let server = MockBackend::start().await;
    let client = logged_in_client(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("penny.db");

    {
        let db = Database::open(&db_path).unwrap();
        let mut workflow = RecommendationWorkflow::load(db);

        let outcome = workflow.refresh(&client).await;
        assert!(matches!(outcome, RefreshOutcome::Updated { pending: 2 }));
        assert_eq!(workflow.available_savings(), Money::from_major(2800.0));

        let food = workflow.resolve("food").unwrap();
        assert!(workflow.apply(&food).unwrap());
        assert_eq!(workflow.estimated_savings(), Money::from_major(2500.0));
    }

    // New process: state comes back from disk, refresh keeps Food applied
    let db = Database::open(&db_path).unwrap();
    let mut workflow = RecommendationWorkflow::load(db);
    assert_eq!(workflow.estimated_savings(), Money::from_major(2500.0));
    assert_eq!(workflow.applied().len(), 1);

    workflow.refresh(&client).await;
    assert_eq!(workflow.pending().len(), 1);
    assert_eq!(workflow.pending()[0].category, CategoryId::new("Transport"));

    assert_eq!(workflow.apply_all().unwrap(), 1);
    assert_eq!(workflow.estimated_savings(), Money::from_major(2800.0));

    assert!(workflow.undo(&CategoryId::new("Food")).unwrap());
    assert_eq!(workflow.estimated_savings(), Money::from_major(300.0));
    assert!(workflow.is_pending(&CategoryId::new("Food")));
}

#[tokio::test]
async fn test_failed_refresh_keeps_displayed_data() {
    let server = MockBackend::start().await;
    let client = logged_in_client(&server).await;

    let mut workflow = RecommendationWorkflow::load(Database::in_memory().unwrap());
    workflow.refresh(&client).await;
    workflow.ignore(&CategoryId::new("Transport"));

    server.fail_insights(true);
    let outcome = workflow.refresh(&client).await;

    match outcome {
        RefreshOutcome::Failed(Error::Api { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(workflow.pending().len(), 1);
    assert_eq!(workflow.snapshot(), Some(&sample_snapshot()));
    assert_eq!(server.insights_calls(), 2);
}

#[tokio::test]
async fn test_refresh_picks_up_new_snapshot() {
    let server = MockBackend::start().await;
    let client = logged_in_client(&server).await;

    let mut workflow = RecommendationWorkflow::load(Database::in_memory().unwrap());
    workflow.refresh(&client).await;
    workflow.apply(&CategoryId::new("Food")).unwrap();

    let mut next = sample_snapshot();
    next.total_income = 0.0;
    next.category_recommendations
        .insert("Rent".to_string(), "Negotiate the lease".to_string());
    next.category_expenses.insert("Rent".to_string(), 4000.0);
    server.set_snapshot(next);

    workflow.refresh(&client).await;

    // Food stays applied with its original savings; zero income gives 0%
    assert_eq!(workflow.estimated_savings(), Money::from_major(2500.0));
    assert_eq!(workflow.pending().len(), 2);
    for rec in workflow.pending() {
        assert_eq!(rec.percent_of_income, 0.0);
    }
}

#[tokio::test]
async fn test_session_token_round_trip() {
    let server = MockBackend::start().await;
    let db = Database::in_memory().unwrap();

    let client = ApiClient::new(&server.url());
    let login = client
        .login(MockBackend::EMAIL, MockBackend::PASSWORD)
        .await
        .unwrap();
    store::save_token(&db, login.token.as_deref().unwrap()).unwrap();

    let token = store::load_token(&db).unwrap().unwrap();
    let snapshot: InsightsSnapshot = client.with_token(token).insights().await.unwrap();
    assert_eq!(snapshot.top_expense, "Food");

    store::clear_token(&db).unwrap();
    assert_eq!(store::load_token(&db).unwrap(), None);
}
