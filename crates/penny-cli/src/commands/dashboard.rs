//! Read-only views (dashboard, report, insights)

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate};
use penny_core::reports::{self, DateRange, Half};
use penny_core::{ApiClient, InsightsSnapshot};

use super::truncate;

pub async fn cmd_dashboard(client: &ApiClient, recent: usize) -> Result<()> {
    let transactions = client
        .transactions()
        .await
        .context("Failed to fetch transactions")?;
    let summary = reports::dashboard_summary(&transactions, recent);

    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│           💰 Penny Dashboard            │");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Total Income:     ${}", summary.total_income);
    println!("  Total Expenses:   ${}", summary.total_expenses);
    println!("  Balance:          ${}", summary.balance);
    println!("  💾 Monthly Savings Target: ${}", summary.monthly_savings);
    println!();

    if summary.recent.is_empty() {
        println!("  No transactions yet.");
        return Ok(());
    }

    println!("  🧾 Recent Transactions");
    println!("     ─────────────────────────────────────────────────────");
    for tx in &summary.recent {
        let kind = tx
            .kind()
            .map(|k| k.as_str().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "     {:10}  {:<28} {:>10.2}  {:<8} {}",
            tx.date.get(..10).unwrap_or(&tx.date),
            truncate(tx.label(), 28),
            tx.amount.abs(),
            kind,
            reports::display_category(&tx.category),
        );
    }
    println!();

    Ok(())
}

/// Resolve report flags to a date range
///
/// `--half` picks a half of `today`'s year. Otherwise the range defaults to
/// Jan 1 through `today`, with either end overridable.
pub fn report_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    half: Option<Half>,
    today: NaiveDate,
) -> Result<DateRange> {
    if let Some(half) = half {
        return Ok(DateRange::half(today.year(), half));
    }

    let ytd = DateRange::year_to_date(today);
    DateRange::new(from.unwrap_or(ytd.start), to.unwrap_or(ytd.end)).map_err(|e| anyhow!(e))
}

pub async fn cmd_report(client: &ApiClient, range: DateRange) -> Result<()> {
    let transactions = client
        .transactions()
        .await
        .context("Failed to fetch transactions")?;
    let report = reports::spending_report(&transactions, range);

    println!();
    println!("📊 Spending Report: {}", report.range);
    println!("   ─────────────────────────────────────────────────────────────");

    if report.categories.is_empty() {
        println!("   No expenses in this range.");
    } else {
        for category in &report.categories {
            println!(
                "   {:<20} ${:>10}  {:>5.1}%",
                category.category,
                category.amount.to_string(),
                category.share
            );
        }
        println!("   ─────────────────────────────────────────────────────────────");
        println!(
            "   {:<20} ${:>10}",
            "Total",
            report.total_expense.to_string()
        );
    }

    println!();
    println!("📅 By Month");
    println!("   {:<10} {:>12} {:>12}", "Month", "Income", "Expense");
    for month in &report.months {
        println!(
            "   {:<10} {:>12} {:>12}",
            month.label(),
            month.income.to_string(),
            month.expense.to_string()
        );
    }
    println!();

    Ok(())
}

pub async fn cmd_insights(client: &ApiClient) -> Result<()> {
    let snapshot = client.insights().await.context("Failed to fetch insights")?;

    println!();
    println!("🧠 Insights");
    println!("   ─────────────────────────────");
    println!("   Income:   ${:.2}", snapshot.total_income);
    println!("   Expense:  ${:.2}", snapshot.total_expense);
    println!("   Balance:  ${:.2}", snapshot.balance);
    print_snapshot_highlights(&snapshot);

    if !snapshot.overall_recommendation.is_empty() {
        println!();
        println!("💡 {}", snapshot.overall_recommendation);
    }
    println!();

    Ok(())
}

/// Top categories, then alerts, one display line each
pub fn snapshot_highlights(snapshot: &InsightsSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    if !snapshot.top_expense.is_empty() {
        lines.push(format!("Top expense category: {}", snapshot.top_expense));
    }
    if !snapshot.top_income.is_empty() {
        lines.push(format!("Top income source:    {}", snapshot.top_income));
    }
    lines.extend(snapshot.alerts.iter().map(|alert| format!("⚠️  {}", alert)));
    lines
}

/// Shared by `penny insights` and the recommendations view
pub fn print_snapshot_highlights(snapshot: &InsightsSnapshot) {
    for line in snapshot_highlights(snapshot) {
        println!("   {}", line);
    }
}
