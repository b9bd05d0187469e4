//! Dashboard and spending reports over the user's transactions
//!
//! Aggregation happens client-side over `GET /api/transactions/all`.
//! Amounts are taken as absolute values; the transaction type decides the
//! side.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::models::{Money, Transaction, TransactionKind};

/// Share of a positive balance suggested as monthly savings
const SAVINGS_RATE: f64 = 0.2;

/// Totals for the dashboard view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_income: Money,
    pub total_expenses: Money,
    pub balance: Money,
    /// 20% of the balance when there is any income, otherwise zero
    pub monthly_savings: Money,
    /// Most recent transactions, newest first
    pub recent: Vec<Transaction>,
}

pub fn dashboard_summary(transactions: &[Transaction], recent_limit: usize) -> DashboardSummary {
    let total_for = |kind: TransactionKind| -> Money {
        transactions
            .iter()
            .filter(|t| t.kind() == Some(kind))
            .map(|t| Money::from_major(t.amount.abs()))
            .sum()
    };

    let total_income = total_for(TransactionKind::Income);
    let total_expenses = total_for(TransactionKind::Expense);
    let balance = total_income - total_expenses;
    let monthly_savings = if total_income > Money::ZERO {
        Money::from_major(balance.as_major() * SAVINGS_RATE)
    } else {
        Money::ZERO
    };

    let mut recent: Vec<Transaction> = transactions.to_vec();
    // Undated transactions sort last
    recent.sort_by(|a, b| b.day().cmp(&a.day()));
    recent.truncate(recent_limit);

    DashboardSummary {
        total_income,
        total_expenses,
        balance,
        monthly_savings,
        recent,
    }
}

/// Display label for a raw backend category
pub fn display_category(raw: &str) -> String {
    match raw.trim().to_lowercase().as_str() {
        "food" => "Food & Dining".to_string(),
        "transport" => "Transport".to_string(),
        "entertainment" => "Entertainment".to_string(),
        "bills" => "Bills".to_string(),
        "income" => "Income".to_string(),
        _ => raw.trim().to_string(),
    }
}

/// Half of a calendar year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    First,
    Second,
}

impl FromStr for Half {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" | "h1" | "1" => Ok(Half::First),
            "second" | "h2" | "2" => Ok(Half::Second),
            _ => Err(format!("Unknown half: {} (use first or second)", s)),
        }
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if start > end {
            return Err(format!("Range start {} is after end {}", start, end));
        }
        Ok(Self { start, end })
    }

    /// January 1st of `today`'s year through `today`
    pub fn year_to_date(today: NaiveDate) -> Self {
        let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        Self { start, end: today }
    }

    /// Jan-Jun or Jul-Dec of `year`
    pub fn half(year: i32, half: Half) -> Self {
        let (start, end) = match half {
            Half::First => ((1, 1), (6, 30)),
            Half::Second => ((7, 1), (12, 31)),
        };
        let date = |(month, day): (u32, u32)| {
            NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
        };
        Self {
            start: date(start),
            end: date(end),
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// First day of each month the range touches
    pub fn months(&self) -> Vec<NaiveDate> {
        let mut months = Vec::new();
        let mut cursor = self.start.with_day(1).unwrap_or(self.start);
        while cursor <= self.end {
            months.push(cursor);
            match cursor.checked_add_months(Months::new(1)) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        months
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Money,
    /// Percent of total expenses in the range
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotals {
    /// First day of the month
    pub month: NaiveDate,
    pub income: Money,
    pub expense: Money,
}

impl MonthTotals {
    /// Short label such as "Jan 2024"
    pub fn label(&self) -> String {
        self.month.format("%b %Y").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingReport {
    pub range: DateRange,
    /// Largest first
    pub categories: Vec<CategoryTotal>,
    pub total_expense: Money,
    pub months: Vec<MonthTotals>,
}

fn is_income(tx: &Transaction) -> bool {
    tx.kind() == Some(TransactionKind::Income)
}

/// Category breakdown and monthly totals for transactions in `range`
///
/// Anything not typed as income counts as an expense; undated transactions
/// are skipped.
pub fn spending_report(transactions: &[Transaction], range: DateRange) -> SpendingReport {
    let in_range: Vec<(&Transaction, NaiveDate)> = transactions
        .iter()
        .filter_map(|t| t.day().map(|d| (t, d)))
        .filter(|(_, d)| range.contains(*d))
        .collect();

    let mut by_category: BTreeMap<String, Money> = BTreeMap::new();
    for (tx, _) in in_range.iter().filter(|(t, _)| !is_income(t)) {
        *by_category.entry(display_category(&tx.category)).or_default() +=
            Money::from_major(tx.amount.abs());
    }

    let total_expense: Money = by_category.values().sum();
    let mut categories: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            share: if total_expense.is_zero() {
                0.0
            } else {
                amount.cents() as f64 * 100.0 / total_expense.cents() as f64
            },
            category,
            amount,
        })
        .collect();
    categories.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.category.cmp(&b.category)));

    let months = range
        .months()
        .into_iter()
        .map(|month| {
            let mut totals = MonthTotals {
                month,
                income: Money::ZERO,
                expense: Money::ZERO,
            };
            for (tx, day) in &in_range {
                if day.year() != month.year() || day.month() != month.month() {
                    continue;
                }
                let amount = Money::from_major(tx.amount.abs());
                if is_income(tx) {
                    totals.income += amount;
                } else {
                    totals.expense += amount;
                }
            }
            totals
        })
        .collect();

    SpendingReport {
        range,
        categories,
        total_expense,
        months,
    }
}
