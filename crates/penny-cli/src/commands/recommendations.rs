//! Recommendation commands and the interactive session
//!
//! One-shot commands refresh, act, and exit. `penny recs session` keeps a
//! workflow alive and multiplexes user input with background refreshes, so
//! the user can keep applying or undoing while a fetch is in flight.

use std::sync::Arc;

use anyhow::{bail, Result};
use penny_core::models::InsightsSnapshot;
use penny_core::recommendations::{
    CategoryId, InsightsSource, Recommendation, RecommendationWorkflow, RefreshOutcome,
    RefreshTicket,
};
use penny_core::KeyValueStore;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{print_snapshot_highlights, truncate};

type RefreshResult = (RefreshTicket, penny_core::Result<InsightsSnapshot>);

/// Load the persisted selection and fetch a fresh snapshot
async fn refreshed_workflow<S, I>(store: S, source: &I) -> Result<RecommendationWorkflow<S>>
where
    S: KeyValueStore,
    I: InsightsSource + ?Sized,
{
    let mut workflow = RecommendationWorkflow::load(store);
    match workflow.refresh(source).await {
        RefreshOutcome::Failed(e) => bail!("Failed to fetch insights: {}", e),
        _ => Ok(workflow),
    }
}

pub async fn cmd_recs_list<S, I>(store: S, source: &I) -> Result<()>
where
    S: KeyValueStore,
    I: InsightsSource + ?Sized,
{
    let workflow = refreshed_workflow(store, source).await?;
    print_workflow(&workflow);
    Ok(())
}

pub async fn cmd_recs_apply<S, I>(store: S, source: &I, categories: &[String]) -> Result<()>
where
    S: KeyValueStore,
    I: InsightsSource + ?Sized,
{
    let mut workflow = refreshed_workflow(store, source).await?;
    for name in categories {
        apply_named(&mut workflow, name)?;
    }
    print_totals(&workflow);
    Ok(())
}

pub async fn cmd_recs_apply_all<S, I>(store: S, source: &I) -> Result<()>
where
    S: KeyValueStore,
    I: InsightsSource + ?Sized,
{
    let mut workflow = refreshed_workflow(store, source).await?;
    apply_all(&mut workflow)?;
    print_totals(&workflow);
    Ok(())
}

/// Undo needs only the persisted selection, so a failed fetch is a warning
pub async fn cmd_recs_undo<S, I>(store: S, source: &I, categories: &[String]) -> Result<()>
where
    S: KeyValueStore,
    I: InsightsSource + ?Sized,
{
    let mut workflow = RecommendationWorkflow::load(store);
    if let RefreshOutcome::Failed(e) = workflow.refresh(source).await {
        warn!("Insights refresh failed, undoing from saved selection: {}", e);
        println!("⚠️  Could not refresh insights ({}); using saved selection", e);
    }
    for name in categories {
        undo_named(&mut workflow, name)?;
    }
    print_totals(&workflow);
    Ok(())
}

pub fn cmd_recs_reset<S: KeyValueStore>(store: S) -> Result<()> {
    let mut workflow = RecommendationWorkflow::load(store);
    let count = workflow.applied().len();
    workflow.reset()?;
    println!("🧹 Cleared {} applied recommendations.", count);
    Ok(())
}

/// What the session loop should do after a line of input
#[derive(Debug, PartialEq, Eq)]
enum LoopControl {
    Continue,
    Refresh,
    Exit,
}

/// Run the interactive session until `quit` or end of input
///
/// The first snapshot is fetched before any input is read. Later refreshes
/// run as spawned tasks whose results come back over a channel; each is
/// merged against the selection state current at the time it arrives.
pub async fn cmd_recs_session<S, I, R>(store: S, source: Arc<I>, input: R) -> Result<()>
where
    S: KeyValueStore,
    I: InsightsSource + ?Sized + 'static,
    R: AsyncBufRead + Unpin,
{
    let mut workflow = RecommendationWorkflow::load(store);

    println!("🔄 Fetching recommendations...");
    let outcome = workflow.refresh(source.as_ref()).await;
    report_refresh(&outcome);
    print_workflow(&workflow);
    print_help();

    let (tx, mut rx) = mpsc::channel::<RefreshResult>(8);
    let mut lines = input.lines();
    let mut input_open = true;
    let mut in_flight = 0usize;

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                match line? {
                    Some(line) => match handle_line(&mut workflow, &line) {
                        LoopControl::Continue => {}
                        LoopControl::Refresh => {
                            spawn_refresh(&mut workflow, &source, &tx);
                            in_flight += 1;
                            println!("🔄 Refreshing in the background...");
                        }
                        LoopControl::Exit => break,
                    },
                    None => input_open = false,
                }
            }
            Some((ticket, result)) = rx.recv() => {
                in_flight = in_flight.saturating_sub(1);
                let outcome = workflow.complete_refresh(ticket, result);
                report_refresh(&outcome);
                if outcome.is_updated() {
                    print_totals(&workflow);
                }
            }
            else => break,
        }

        // End of input: let outstanding refreshes land, then stop
        if !input_open && in_flight == 0 {
            break;
        }
    }

    println!("👋 Saved ${} in estimated savings.", workflow.estimated_savings());
    Ok(())
}

fn spawn_refresh<S, I>(
    workflow: &mut RecommendationWorkflow<S>,
    source: &Arc<I>,
    tx: &mpsc::Sender<RefreshResult>,
) where
    S: KeyValueStore,
    I: InsightsSource + ?Sized + 'static,
{
    let ticket = workflow.begin_refresh();
    let source = Arc::clone(source);
    let tx = tx.clone();
    debug!("Spawning refresh #{}", ticket.seq());
    tokio::spawn(async move {
        let result = source.fetch_insights().await;
        let _ = tx.send((ticket, result)).await;
    });
}

fn handle_line<S: KeyValueStore>(
    workflow: &mut RecommendationWorkflow<S>,
    line: &str,
) -> LoopControl {
    let line = line.trim();
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    let result = match command.to_lowercase().as_str() {
        "" => Ok(()),
        "list" | "ls" => {
            print_workflow(workflow);
            Ok(())
        }
        "apply" if !arg.is_empty() => apply_named(workflow, arg),
        "ignore" if !arg.is_empty() => {
            ignore_named(workflow, arg);
            Ok(())
        }
        "undo" if !arg.is_empty() => undo_named(workflow, arg),
        "all" | "apply-all" => apply_all(workflow),
        "refresh" => return LoopControl::Refresh,
        "help" | "?" => {
            print_help();
            Ok(())
        }
        "quit" | "exit" | "q" => return LoopControl::Exit,
        "apply" | "ignore" | "undo" => {
            println!("   Usage: {} <category>", command);
            Ok(())
        }
        other => {
            println!("   Unknown command '{}'. Type 'help' for commands.", other);
            Ok(())
        }
    };

    // Store failures leave the workflow unchanged; report and keep going
    if let Err(e) = result {
        println!("❌ {}", e);
    }
    LoopControl::Continue
}

fn apply_named<S: KeyValueStore>(
    workflow: &mut RecommendationWorkflow<S>,
    name: &str,
) -> Result<()> {
    let Some(category) = workflow.resolve(name) else {
        println!("   Nothing to do: no recommendation for '{}'", name);
        return Ok(());
    };
    if workflow.apply(&category)? {
        println!("✅ Applied {}", category);
    } else {
        println!("   Nothing to do: {} is already applied", category);
    }
    Ok(())
}

fn ignore_named<S: KeyValueStore>(workflow: &mut RecommendationWorkflow<S>, name: &str) {
    match workflow.resolve(name) {
        Some(category) if workflow.ignore(&category) => {
            println!("🙈 Ignored {} until the next refresh", category)
        }
        _ => println!("   Nothing to do: '{}' is not pending", name),
    }
}

fn undo_named<S: KeyValueStore>(
    workflow: &mut RecommendationWorkflow<S>,
    name: &str,
) -> Result<()> {
    let category = workflow.resolve(name).unwrap_or_else(|| CategoryId::new(name));
    if workflow.undo(&category)? {
        println!("↩️  Moved {} back to pending", category);
    } else {
        println!("   Nothing to do: '{}' is not applied", name);
    }
    Ok(())
}

fn apply_all<S: KeyValueStore>(workflow: &mut RecommendationWorkflow<S>) -> Result<()> {
    match workflow.apply_all()? {
        0 => println!("   Nothing to do: no pending recommendations"),
        count => println!("✅ Applied {} recommendations", count),
    }
    Ok(())
}

fn report_refresh(outcome: &RefreshOutcome) {
    match outcome {
        RefreshOutcome::Updated { pending } => {
            println!("✨ Insights updated, {} pending recommendations", pending)
        }
        RefreshOutcome::Stale => debug!("Ignored an out-of-date refresh"),
        RefreshOutcome::Failed(e) => {
            println!("❌ Failed to fetch insights: {}", e);
            println!("   Showing the last data loaded. Type 'refresh' to retry.");
        }
    }
}

fn print_help() {
    println!();
    println!("Commands: list, apply <category>, ignore <category>, all,");
    println!("          undo <category>, refresh, help, quit");
    println!();
}

fn print_workflow<S: KeyValueStore>(workflow: &RecommendationWorkflow<S>) {
    if let Some(snapshot) = workflow.snapshot() {
        println!();
        println!("💰 Savings Recommendations");
        println!("   ─────────────────────────────────────────────────────────────");
        println!(
            "   Income ${:.2}   Expense ${:.2}   Balance ${:.2}",
            snapshot.total_income, snapshot.total_expense, snapshot.balance
        );
        print_snapshot_highlights(snapshot);
        if !snapshot.overall_recommendation.is_empty() {
            println!("   💡 {}", snapshot.overall_recommendation);
        }
    }

    println!();
    if workflow.pending().is_empty() {
        println!("📋 Pending: none");
    } else {
        println!("📋 Pending");
        for rec in workflow.pending() {
            print_recommendation(rec);
        }
    }

    println!();
    if workflow.applied().is_empty() {
        println!("✅ Applied: none");
    } else {
        println!("✅ Applied");
        for rec in workflow.applied() {
            println!(
                "   {:<18} ${:>10}  {}",
                rec.category.display_name(),
                rec.potential_savings.to_string(),
                truncate(&rec.suggestion, 40)
            );
        }
    }

    print_totals(workflow);
}

fn print_recommendation(rec: &Recommendation) {
    let icon = match rec.impact {
        penny_core::Impact::High => "🔴",
        penny_core::Impact::Medium => "🟡",
        penny_core::Impact::Low => "🟢",
    };
    println!(
        "   {} {:<18} {:<6} {:>5.1}% of income   save ${}",
        icon,
        rec.category.display_name(),
        rec.impact.as_str(),
        rec.percent_of_income,
        rec.potential_savings
    );
    println!("      {}", rec.hint);
    if !rec.suggestion.is_empty() {
        println!("      {}", rec.suggestion);
    }
}

fn print_totals<S: KeyValueStore>(workflow: &RecommendationWorkflow<S>) {
    println!();
    println!("   💾 Estimated savings (applied): ${}", workflow.estimated_savings());
    println!("   💸 Available (pending):         ${}", workflow.available_savings());
    println!();
}
