//! Data models for Penny
//!
//! Wire types mirror the backend's camelCase JSON. Every snapshot field is
//! optional on the wire so a partial response degrades to zeros instead of
//! failing to parse.

use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result as PennyResult};

/// A currency amount held as whole minor units (cents)
///
/// Backend amounts arrive as JSON numbers in major units and are rounded to
/// the nearest cent on entry, so sums and differences are exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest major-unit magnitude accepted from the wire (ten trillion)
    pub const MAX_MAJOR: f64 = 1e13;

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Convert a major-unit amount, rounding to the nearest cent.
    /// Non-finite input and magnitudes above [`Money::MAX_MAJOR`] are treated
    /// as malformed and become zero.
    pub fn from_major(amount: f64) -> Self {
        if !Self::is_valid_major(amount) {
            return Self::ZERO;
        }
        Self((amount * 100.0).round() as i64)
    }

    /// Whether a major-unit amount is finite and within range
    pub fn is_valid_major(amount: f64) -> bool {
        amount.is_finite() && amount.abs() <= Self::MAX_MAJOR
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn as_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid amount: {}", s))?;
        if !Money::is_valid_major(value) {
            return Err(format!("Invalid amount: {}", s));
        }
        Ok(Money::from_major(value))
    }
}

// Arithmetic saturates at the i64 bounds rather than panicking or wrapping

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Ok(Money::from_major(value))
    }
}

/// Aggregate financial summary returned by `GET /api/insights/ai`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsightsSnapshot {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
    pub daily_average_expense: f64,
    pub daily_average_income: f64,
    /// Category name -> amount spent
    pub category_expenses: BTreeMap<String, f64>,
    /// Category name -> percent of income, as computed by the backend
    pub category_percent_income: BTreeMap<String, f64>,
    /// Category name -> suggestion text
    pub category_recommendations: BTreeMap<String, String>,
    pub alerts: Vec<String>,
    pub top_expense: String,
    pub top_income: String,
    pub monthly_trends: BTreeMap<String, String>,
    pub overall_recommendation: String,
    pub suggested_savings: f64,
}

impl InsightsSnapshot {
    /// Expense recorded for a category, zero when the backend omitted it
    pub fn expense_for(&self, category: &str) -> f64 {
        self.category_expenses.get(category).copied().unwrap_or(0.0)
    }
}

/// Income or expense, from the backend's `transactionType` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "INCOME",
            TransactionKind::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOME" => Ok(TransactionKind::Income),
            "EXPENSE" => Ok(TransactionKind::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

/// Transaction identifier; the backend has used both numeric and string ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionId {
    Number(i64),
    Text(String),
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionId::Number(n) => write!(f, "{}", n),
            TransactionId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A transaction as returned by `GET /api/transactions/all`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: f64,
    /// ISO date, optionally followed by a time component
    pub date: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub transaction_type: Option<String>,
}

impl Transaction {
    /// Parsed transaction type; `None` when missing or unrecognized
    pub fn kind(&self) -> Option<TransactionKind> {
        self.transaction_type.as_deref()?.parse().ok()
    }

    /// Calendar date of the transaction (time component ignored)
    pub fn day(&self) -> Option<NaiveDate> {
        let day = self.date.get(..10).unwrap_or(&self.date);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    /// Best human label: title, then description, then category
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.description.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(&self.category)
    }
}

/// Body for `POST /api/transactions/add` and `PATCH /api/transactions/update/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    /// ISO timestamp at midnight UTC of the transaction day
    pub date: String,
    pub category: String,
    pub description: String,
    pub amount: f64,
    /// `INCOME` or `EXPENSE`
    pub transaction_type: String,
}

impl TransactionInput {
    /// Validated input: every field is required and the amount must be positive
    pub fn new(
        date: NaiveDate,
        category: &str,
        description: &str,
        amount: f64,
        kind: TransactionKind,
    ) -> PennyResult<Self> {
        let category = category.trim();
        let description = description.trim();
        if category.is_empty() || description.is_empty() {
            return Err(Error::InvalidData("All fields are required".to_string()));
        }
        if !Money::is_valid_major(amount) {
            return Err(Error::InvalidData(format!(
                "Amount must be a valid number, got {}",
                amount
            )));
        }
        if amount <= 0.0 {
            return Err(Error::InvalidData(
                "Amount must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            date: format!("{}T00:00:00.000Z", date.format("%Y-%m-%d")),
            category: category.to_string(),
            description: description.to_string(),
            amount,
            transaction_type: kind.as_str().to_string(),
        })
    }
}

/// Body for `POST /api/auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body for a profile change via `PATCH /api/auth/update`
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
}

/// Body for a password change via `PATCH /api/auth/update`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdate {
    pub current_password: String,
    pub new_password: String,
}

/// Acknowledgement body from mutating endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageResponse {
    pub message: Option<String>,
}

/// Body for `POST /api/auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response from `POST /api/auth/login`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginResponse {
    pub token: Option<String>,
    pub message: Option<String>,
}

/// Response from `GET /api/auth/me`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub name: Option<String>,
    pub email: Option<String>,
}
