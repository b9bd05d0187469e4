//! Test utilities for penny-core
//!
//! This module provides a mock finance backend that serves the routes Penny
//! consumes, for unit and integration tests of the API client, the
//! recommendation workflow and the CLI.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

use crate::models::{InsightsSnapshot, Transaction, TransactionId, TransactionInput};

/// The logged-in account, as `/api/auth/update` leaves it
struct Account {
    name: String,
    email: String,
    password: String,
}

struct MockState {
    account: Mutex<Account>,
    /// Emails taken by `/api/auth/register`
    registered: Mutex<Vec<String>>,
    snapshot: Mutex<InsightsSnapshot>,
    transactions: Mutex<Vec<Transaction>>,
    fail_insights: AtomicBool,
    insights_calls: AtomicUsize,
}

/// Mock backend server for testing and development
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    /// Credentials the mock accepts
    pub const EMAIL: &'static str = "saver@example.com";
    pub const PASSWORD: &'static str = "hunter2!";
    /// Token issued on login and required by authenticated routes
    pub const TOKEN: &'static str = "mock-token-123";

    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            account: Mutex::new(Account {
                name: "Sam Saver".to_string(),
                email: Self::EMAIL.to_string(),
                password: Self::PASSWORD.to_string(),
            }),
            registered: Mutex::new(vec![Self::EMAIL.to_string()]),
            snapshot: Mutex::new(sample_snapshot()),
            transactions: Mutex::new(sample_transactions()),
            fail_insights: AtomicBool::new(false),
            insights_calls: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/api/auth/login", post(handle_login))
            .route("/api/auth/register", post(handle_register))
            .route("/api/auth/me", get(handle_me))
            .route("/api/auth/update", patch(handle_update_account))
            .route("/api/insights/ai", get(handle_insights))
            .route("/api/transactions/all", get(handle_transactions))
            .route("/api/transactions/add", post(handle_add_transaction))
            .route(
                "/api/transactions/update/:id",
                patch(handle_update_transaction),
            )
            .route(
                "/api/transactions/delete/:id",
                delete(handle_delete_transaction),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replace the snapshot served by `/api/insights/ai`
    pub fn set_snapshot(&self, snapshot: InsightsSnapshot) {
        *self.state.snapshot.lock().unwrap() = snapshot;
    }

    pub fn set_transactions(&self, transactions: Vec<Transaction>) {
        *self.state.transactions.lock().unwrap() = transactions;
    }

    /// Transactions as currently stored, after any edits
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.transactions.lock().unwrap().clone()
    }

    /// Make `/api/insights/ai` answer 500
    pub fn fail_insights(&self, fail: bool) {
        self.state.fail_insights.store(fail, Ordering::SeqCst);
    }

    /// Number of insights requests served (including failures)
    pub fn insights_calls(&self) -> usize {
        self.state.insights_calls.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Snapshot with Food at 25% of income and Transport at 3%
pub fn sample_snapshot() -> InsightsSnapshot {
    let expenses: BTreeMap<String, f64> = [("Food", 2500.0), ("Transport", 300.0)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    let recommendations: BTreeMap<String, String> = [
        ("Food", "Cut dining out to twice a week"),
        ("Transport", "Carpool on weekdays"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    InsightsSnapshot {
        total_income: 10000.0,
        total_expense: 2800.0,
        balance: 7200.0,
        category_expenses: expenses,
        category_recommendations: recommendations,
        alerts: vec!["Food spending is above 20% of income".to_string()],
        top_expense: "Food".to_string(),
        top_income: "Salary".to_string(),
        ..Default::default()
    }
}

/// Income plus a handful of expenses across two months
pub fn sample_transactions() -> Vec<Transaction> {
    fn tx(
        id: i64,
        title: &str,
        amount: f64,
        date: &str,
        category: &str,
        kind: &str,
    ) -> Transaction {
        Transaction {
            id: TransactionId::Number(id),
            title: Some(title.to_string()),
            description: None,
            amount,
            date: date.to_string(),
            category: category.to_string(),
            transaction_type: Some(kind.to_string()),
        }
    }

    vec![
        tx(1, "Salary", 10000.0, "2024-01-01", "income", "INCOME"),
        tx(2, "Groceries", -1500.0, "2024-01-05", "food", "EXPENSE"),
        tx(3, "Bus pass", 300.0, "2024-01-10", "transport", "EXPENSE"),
        tx(4, "Restaurant", 1000.0, "2024-02-02", "food", "expense"),
        tx(5, "Cinema", 200.0, "2024-02-14", "entertainment", "EXPENSE"),
        tx(6, "Freelance", 500.0, "2024-02-20", "income", "income"),
    ]
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        == Some(MockBackend::TOKEN)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Invalid or expired token" })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn handle_login(
    State(state): State<Arc<MockState>>,
    Json(body): Json<LoginBody>,
) -> Response {
    let account = state.account.lock().unwrap();
    if body.email == account.email && body.password == account.password {
        Json(json!({ "token": MockBackend::TOKEN, "message": "Login successful" })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
}

async fn handle_register(
    State(state): State<Arc<MockState>>,
    Json(body): Json<RegisterBody>,
) -> Response {
    if body.name.is_empty() || body.password.is_empty() {
        return message(StatusCode::BAD_REQUEST, "All fields are required");
    }
    let mut registered = state.registered.lock().unwrap();
    if registered.contains(&body.email) {
        return message(StatusCode::BAD_REQUEST, "User already exists");
    }
    registered.push(body.email);
    message(StatusCode::CREATED, "User registered successfully")
}

async fn handle_me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let account = state.account.lock().unwrap();
    Json(json!({ "name": account.name, "email": account.email })).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountUpdateBody {
    name: Option<String>,
    email: Option<String>,
    current_password: Option<String>,
    new_password: Option<String>,
}

async fn handle_update_account(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<AccountUpdateBody>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut account = state.account.lock().unwrap();

    if let Some(new_password) = body.new_password {
        if body.current_password.as_deref() != Some(account.password.as_str()) {
            return message(StatusCode::BAD_REQUEST, "Current password is incorrect");
        }
        account.password = new_password;
        return message(StatusCode::OK, "Password updated successfully");
    }

    if let Some(name) = body.name {
        account.name = name;
    }
    if let Some(email) = body.email {
        account.email = email;
    }
    message(StatusCode::OK, "Profile updated successfully")
}

async fn handle_insights(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.insights_calls.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return unauthorized();
    }
    if state.fail_insights.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Failed to fetch AI insights" })),
        )
            .into_response();
    }
    let snapshot = state.snapshot.lock().unwrap().clone();
    Json(snapshot).into_response()
}

async fn handle_transactions(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let transactions = state.transactions.lock().unwrap().clone();
    Json(transactions).into_response()
}

fn stored_transaction(id: TransactionId, input: TransactionInput) -> Transaction {
    Transaction {
        id,
        title: None,
        description: Some(input.description),
        amount: input.amount,
        date: input.date,
        category: input.category,
        transaction_type: Some(input.transaction_type),
    }
}

async fn handle_add_transaction(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(input): Json<TransactionInput>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut transactions = state.transactions.lock().unwrap();
    let next_id = transactions
        .iter()
        .filter_map(|t| match t.id {
            TransactionId::Number(n) => Some(n),
            TransactionId::Text(_) => None,
        })
        .max()
        .unwrap_or(0)
        + 1;
    transactions.push(stored_transaction(TransactionId::Number(next_id), input));
    message(StatusCode::CREATED, "Transaction added successfully")
}

async fn handle_update_transaction(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<TransactionInput>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut transactions = state.transactions.lock().unwrap();
    match transactions.iter_mut().find(|t| t.id.to_string() == id) {
        Some(existing) => {
            *existing = stored_transaction(existing.id.clone(), input);
            message(StatusCode::OK, "Transaction updated successfully")
        }
        None => message(StatusCode::NOT_FOUND, "Transaction not found"),
    }
}

async fn handle_delete_transaction(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut transactions = state.transactions.lock().unwrap();
    let before = transactions.len();
    transactions.retain(|t| t.id.to_string() != id);
    if transactions.len() == before {
        return message(StatusCode::NOT_FOUND, "Transaction not found");
    }
    message(StatusCode::OK, "Transaction deleted successfully")
}
