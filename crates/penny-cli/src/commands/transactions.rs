//! Transaction commands (list, add, edit, rm)

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use penny_core::models::TransactionId;
use penny_core::reports;
use penny_core::{ApiClient, Transaction, TransactionInput, TransactionKind};
use tracing::info;

use super::truncate;

/// Fields of `penny tx edit`; anything left `None` keeps its stored value
#[derive(Debug, Default)]
pub struct TransactionEdit {
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub kind: Option<TransactionKind>,
}

impl TransactionEdit {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.amount.is_none()
            && self.kind.is_none()
    }

    /// Overlay the edit on `existing` and validate the result
    pub fn apply_to(&self, existing: &Transaction) -> Result<TransactionInput> {
        let date = match self.date {
            Some(date) => date,
            None => existing
                .day()
                .ok_or_else(|| anyhow!("Transaction {} has no readable date", existing.id))?,
        };
        let kind = match self.kind {
            Some(kind) => kind,
            None => existing.kind().unwrap_or(TransactionKind::Expense),
        };
        // Stored expenses may be signed; the backend takes magnitudes
        let amount = self.amount.unwrap_or(existing.amount.abs());

        let input = TransactionInput::new(
            date,
            self.category.as_deref().unwrap_or(&existing.category),
            self.description.as_deref().unwrap_or(existing.label()),
            amount,
            kind,
        )?;
        Ok(input)
    }
}

/// Parse a user-supplied id the way the backend would echo it back
pub fn parse_transaction_id(raw: &str) -> TransactionId {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(n) => TransactionId::Number(n),
        Err(_) => TransactionId::Text(raw.to_string()),
    }
}

pub async fn cmd_tx_list(
    client: &ApiClient,
    kind: Option<TransactionKind>,
    limit: Option<usize>,
) -> Result<()> {
    let mut transactions = client
        .transactions()
        .await
        .context("Failed to fetch transactions")?;
    if let Some(kind) = kind {
        transactions.retain(|tx| tx.kind() == Some(kind));
    }
    // Newest first; unparseable dates sort last
    transactions.sort_by(|a, b| b.day().cmp(&a.day()));
    if let Some(limit) = limit {
        transactions.truncate(limit);
    }

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!();
    println!(
        "   {:<8} {:10}  {:<28} {:>10}  {:<8} Category",
        "ID", "Date", "Description", "Amount", "Type"
    );
    println!("   ────────────────────────────────────────────────────────────────────────────");
    for tx in &transactions {
        let kind = tx
            .kind()
            .map(|k| k.as_str().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:<8} {:10}  {:<28} {:>10.2}  {:<8} {}",
            truncate(&tx.id.to_string(), 8),
            tx.date.get(..10).unwrap_or(&tx.date),
            truncate(tx.label(), 28),
            tx.amount.abs(),
            kind,
            reports::display_category(&tx.category),
        );
    }
    println!();
    println!("   {} transaction(s)", transactions.len());

    Ok(())
}

pub async fn cmd_tx_add(client: &ApiClient, input: &TransactionInput) -> Result<()> {
    let reply = client
        .add_transaction(input)
        .await
        .context("Failed to add transaction")?;
    info!(
        "Added {} {} in {}",
        input.transaction_type, input.amount, input.category
    );
    println!(
        "✅ {}",
        reply.message.as_deref().unwrap_or("Transaction added successfully")
    );
    Ok(())
}

pub async fn cmd_tx_edit(client: &ApiClient, id: &str, edit: &TransactionEdit) -> Result<()> {
    if edit.is_empty() {
        return Err(anyhow!(
            "Nothing to change: pass --date, --category, --description, --amount or --kind"
        ));
    }

    let transactions = client
        .transactions()
        .await
        .context("Failed to fetch transactions")?;
    let existing = transactions
        .iter()
        .find(|tx| tx.id.to_string() == id.trim())
        .ok_or_else(|| anyhow!("No transaction with id {}", id.trim()))?;

    let input = edit.apply_to(existing)?;
    let reply = client
        .update_transaction(&existing.id, &input)
        .await
        .context("Failed to update transaction")?;
    println!(
        "✅ {}",
        reply.message.as_deref().unwrap_or("Transaction updated successfully")
    );
    Ok(())
}

pub async fn cmd_tx_rm(client: &ApiClient, id: &str) -> Result<()> {
    let id = parse_transaction_id(id);
    let reply = client
        .delete_transaction(&id)
        .await
        .with_context(|| format!("Failed to delete transaction {}", id))?;
    println!(
        "🗑️  {}",
        reply.message.as_deref().unwrap_or("Transaction deleted successfully")
    );
    Ok(())
}
