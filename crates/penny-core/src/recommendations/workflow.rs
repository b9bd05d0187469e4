//! Apply / ignore / undo workflow over pending and applied recommendations

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{InsightsSnapshot, Money};
use crate::store::KeyValueStore;

use super::derive;
use super::refresh::{InsightsSource, RefreshOutcome, RefreshSequencer, RefreshTicket};
use super::selection::SelectionState;
use super::types::{CategoryId, Recommendation};

/// Pending and applied recommendations plus the store that persists them
///
/// A category is either pending or applied, never both. Persisted mutations
/// write the next selection state to the store before committing it in
/// memory, so a failed write changes nothing.
pub struct RecommendationWorkflow<S> {
    store: S,
    selection: SelectionState,
    pending: Vec<Recommendation>,
    snapshot: Option<InsightsSnapshot>,
    fetched_at: Option<DateTime<Utc>>,
    sequencer: RefreshSequencer,
}

impl<S: KeyValueStore> RecommendationWorkflow<S> {
    /// Start from whatever selection state the store holds
    pub fn load(store: S) -> Self {
        let selection = SelectionState::load(&store);
        debug!(
            "Loaded {} applied recommendations (savings {})",
            selection.len(),
            selection.estimated_savings()
        );
        Self {
            store,
            selection,
            pending: Vec::new(),
            snapshot: None,
            fetched_at: None,
            sequencer: RefreshSequencer::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn applied(&self) -> &[Recommendation] {
        self.selection.applied()
    }

    pub fn pending(&self) -> &[Recommendation] {
        &self.pending
    }

    /// Last accepted snapshot, if any refresh has succeeded
    pub fn snapshot(&self) -> Option<&InsightsSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Running total over applied recommendations
    pub fn estimated_savings(&self) -> Money {
        self.selection.estimated_savings()
    }

    /// Sum over pending recommendations
    pub fn available_savings(&self) -> Money {
        self.pending.iter().map(|r| r.potential_savings).sum()
    }

    pub fn is_pending(&self, category: &CategoryId) -> bool {
        self.pending_index(category).is_some()
    }

    pub fn is_applied(&self, category: &CategoryId) -> bool {
        self.selection.contains(category)
    }

    /// Map user input to a known category
    ///
    /// Exact key match wins; otherwise a case-insensitive match on display
    /// name across pending and applied.
    pub fn resolve(&self, input: &str) -> Option<CategoryId> {
        let known = || self.pending.iter().chain(self.selection.applied().iter());

        if let Some(rec) = known().find(|r| r.category.as_key() == input) {
            return Some(rec.category.clone());
        }

        let wanted = input.trim();
        known()
            .find(|r| r.category.display_name().eq_ignore_ascii_case(wanted))
            .map(|r| r.category.clone())
    }

    /// Move a pending recommendation to applied
    ///
    /// Returns `Ok(false)` without side effects if the category is not pending.
    pub fn apply(&mut self, category: &CategoryId) -> Result<bool> {
        let Some(index) = self.pending_index(category) else {
            debug!("Apply ignored, {} is not pending", category);
            return Ok(false);
        };

        let mut next = self.selection.clone();
        next.insert(self.pending[index].clone());
        self.commit(next)?;
        self.pending.remove(index);

        info!("Applied recommendation for {}", category);
        Ok(true)
    }

    /// Drop a pending recommendation for this session
    ///
    /// Not persisted: the next refresh brings it back unless it was applied
    /// in the meantime.
    pub fn ignore(&mut self, category: &CategoryId) -> bool {
        match self.pending_index(category) {
            Some(index) => {
                self.pending.remove(index);
                debug!("Ignored recommendation for {}", category);
                true
            }
            None => false,
        }
    }

    /// Apply every pending recommendation in one update
    ///
    /// Returns how many were applied.
    pub fn apply_all(&mut self) -> Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let mut next = self.selection.clone();
        let mut count = 0;
        for rec in &self.pending {
            if next.insert(rec.clone()) {
                count += 1;
            }
        }
        self.commit(next)?;
        self.pending.clear();

        info!("Applied {} recommendations", count);
        Ok(count)
    }

    /// Move an applied recommendation back to pending
    ///
    /// Returns `Ok(false)` without side effects if the category is not applied.
    pub fn undo(&mut self, category: &CategoryId) -> Result<bool> {
        let mut next = self.selection.clone();
        let Some(rec) = next.remove(category) else {
            debug!("Undo ignored, {} is not applied", category);
            return Ok(false);
        };
        self.commit(next)?;
        self.pending.push(rec);

        info!("Removed applied recommendation for {}", category);
        Ok(true)
    }

    /// Forget every applied recommendation and zero the total
    ///
    /// Categories from the current snapshot return to pending.
    pub fn reset(&mut self) -> Result<()> {
        SelectionState::clear(&self.store)?;
        self.selection = SelectionState::default();
        self.recompute_pending();
        info!("Selection state cleared");
        Ok(())
    }

    /// Replace the snapshot and rebuild pending against the current selection
    pub fn load_snapshot(&mut self, snapshot: InsightsSnapshot) {
        self.snapshot = Some(snapshot);
        self.fetched_at = Some(Utc::now());
        self.recompute_pending();
    }

    /// Start a refresh; pass the ticket to [`Self::complete_refresh`]
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.sequencer.issue()
    }

    /// Merge a fetch result
    ///
    /// Stale tickets are dropped whatever their result. Failures leave the
    /// previous snapshot and pending list untouched.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<InsightsSnapshot>,
    ) -> RefreshOutcome {
        if !self.sequencer.is_current(ticket) {
            debug!("Dropping stale refresh #{}", ticket.seq());
            return RefreshOutcome::Stale;
        }

        match result {
            Ok(snapshot) => {
                self.sequencer.accept(ticket);
                self.load_snapshot(snapshot);
                debug!(
                    "Refresh #{} applied, {} pending",
                    ticket.seq(),
                    self.pending.len()
                );
                RefreshOutcome::Updated {
                    pending: self.pending.len(),
                }
            }
            Err(e) => {
                warn!("Refresh #{} failed: {}", ticket.seq(), e);
                RefreshOutcome::Failed(e)
            }
        }
    }

    /// Fetch a snapshot from `source` and merge it
    pub async fn refresh<I>(&mut self, source: &I) -> RefreshOutcome
    where
        I: InsightsSource + ?Sized,
    {
        let ticket = self.begin_refresh();
        let result = source.fetch_insights().await;
        self.complete_refresh(ticket, result)
    }

    fn pending_index(&self, category: &CategoryId) -> Option<usize> {
        self.pending.iter().position(|r| &r.category == category)
    }

    fn recompute_pending(&mut self) {
        self.pending = match &self.snapshot {
            Some(snapshot) => derive::pending(snapshot, &self.selection),
            None => Vec::new(),
        };
    }

    fn commit(&mut self, next: SelectionState) -> Result<()> {
        next.save(&self.store)?;
        self.selection = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::recommendations::selection::SELECTED_KEY;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    fn snapshot(income: f64, expenses: &[(&str, f64)]) -> InsightsSnapshot {
        InsightsSnapshot {
            total_income: income,
            category_expenses: expenses
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
            category_recommendations: expenses
                .iter()
                .map(|(k, _)| (k.to_string(), format!("Spend less on {}", k)))
                .collect::<BTreeMap<_, _>>(),
            ..Default::default()
        }
    }

    fn food_and_transport() -> InsightsSnapshot {
        snapshot(10000.0, &[("Food", 2500.0), ("Transport", 300.0)])
    }

    fn workflow() -> RecommendationWorkflow<MemoryStore> {
        let mut wf = RecommendationWorkflow::load(MemoryStore::new());
        wf.load_snapshot(food_and_transport());
        wf
    }

    fn cat(name: &str) -> CategoryId {
        CategoryId::new(name)
    }

    fn assert_invariant(wf: &RecommendationWorkflow<MemoryStore>) {
        let sum: Money = wf.applied().iter().map(|r| r.potential_savings).sum();
        assert_eq!(wf.estimated_savings(), sum);
        for rec in wf.pending() {
            assert!(!wf.is_applied(&rec.category));
        }
    }

    /// Store whose writes always fail
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::InvalidData("disk full".into()))
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    struct FixedSource(Option<InsightsSnapshot>);

    #[async_trait]
    impl InsightsSource for FixedSource {
        async fn fetch_insights(&self) -> Result<InsightsSnapshot> {
            self.0.clone().ok_or_else(|| Error::Api {
                status: 500,
                message: "boom".into(),
            })
        }
    }

    #[test]
    fn test_apply_moves_to_applied() {
        let mut wf = workflow();
        assert!(wf.apply(&cat("Food")).unwrap());

        assert!(!wf.is_pending(&cat("Food")));
        assert!(wf.is_applied(&cat("Food")));
        assert_eq!(wf.estimated_savings(), Money::from_major(2500.0));
        assert!(wf.applied()[0].applied);
        assert_invariant(&wf);
    }

    #[test]
    fn test_apply_unknown_is_noop() {
        let mut wf = workflow();
        wf.apply(&cat("Food")).unwrap();

        assert!(!wf.apply(&cat("Food")).unwrap());
        assert!(!wf.apply(&cat("Nope")).unwrap());
        assert_eq!(wf.estimated_savings(), Money::from_major(2500.0));
        assert_eq!(wf.applied().len(), 1);
    }

    #[test]
    fn test_ignore_only_touches_pending() {
        let mut wf = workflow();
        let before = wf.selection().clone();

        assert!(wf.ignore(&cat("Transport")));
        assert!(!wf.is_pending(&cat("Transport")));
        assert_eq!(wf.selection(), &before);
        assert_eq!(wf.store().get(SELECTED_KEY).unwrap(), None);
    }

    #[test]
    fn test_ignore_absent_is_idempotent() {
        let mut wf = workflow();
        wf.ignore(&cat("Transport"));
        let pending = wf.pending().to_vec();
        let selection = wf.selection().clone();

        assert!(!wf.ignore(&cat("Transport")));
        assert_eq!(wf.pending(), pending.as_slice());
        assert_eq!(wf.selection(), &selection);
    }

    #[test]
    fn test_apply_all_scenario() {
        let mut wf = workflow();
        let before = wf.estimated_savings();

        assert_eq!(wf.apply_all().unwrap(), 2);
        assert_eq!(wf.estimated_savings() - before, Money::from_major(2800.0));
        assert!(wf.pending().is_empty());
        assert!(wf.is_applied(&cat("Food")));
        assert!(wf.is_applied(&cat("Transport")));
        assert_invariant(&wf);

        assert_eq!(wf.apply_all().unwrap(), 0);
    }

    #[test]
    fn test_extreme_amounts_do_not_overflow() {
        let mut wf = RecommendationWorkflow::load(MemoryStore::new());
        wf.load_snapshot(snapshot(1e300, &[("A", 1e20), ("B", 1e20)]));

        assert_eq!(wf.available_savings(), Money::ZERO);
        assert_eq!(wf.apply_all().unwrap(), 2);
        assert_eq!(wf.estimated_savings(), Money::ZERO);
        assert_invariant(&wf);

        // Largest accepted amounts still sum without wrapping
        let mut wf = RecommendationWorkflow::load(MemoryStore::new());
        let max = Money::MAX_MAJOR;
        wf.load_snapshot(snapshot(1e300, &[("A", max), ("B", max), ("C", -max)]));
        assert_eq!(wf.apply_all().unwrap(), 3);
        assert_eq!(wf.estimated_savings(), Money::from_major(max));
        assert_invariant(&wf);

        assert!(wf.undo(&cat("A")).unwrap());
        assert_eq!(wf.estimated_savings(), Money::ZERO);
        assert_invariant(&wf);
    }

    #[test]
    fn test_apply_then_undo_roundtrip() {
        let mut wf = workflow();
        wf.apply(&cat("Transport")).unwrap();
        let before = wf.estimated_savings();

        wf.apply(&cat("Food")).unwrap();
        assert!(wf.undo(&cat("Food")).unwrap());

        assert_eq!(wf.estimated_savings(), before);
        let food = wf
            .pending()
            .iter()
            .find(|r| r.category == cat("Food"))
            .unwrap();
        assert!(!food.applied);
        assert_invariant(&wf);
    }

    #[test]
    fn test_undo_unknown_is_noop() {
        let mut wf = workflow();
        assert!(!wf.undo(&cat("Food")).unwrap());
        assert_eq!(wf.pending().len(), 2);
    }

    #[test]
    fn test_invariant_over_mixed_sequence() {
        let mut wf = RecommendationWorkflow::load(MemoryStore::new());
        wf.load_snapshot(snapshot(
            3333.0,
            &[("A", 0.1), ("B", 0.2), ("C", 0.7), ("D", 1234.56)],
        ));

        wf.apply(&cat("A")).unwrap();
        assert_invariant(&wf);
        wf.apply(&cat("B")).unwrap();
        assert_invariant(&wf);
        wf.undo(&cat("A")).unwrap();
        assert_invariant(&wf);
        wf.apply_all().unwrap();
        assert_invariant(&wf);
        wf.undo(&cat("D")).unwrap();
        wf.undo(&cat("B")).unwrap();
        assert_invariant(&wf);
        assert_eq!(wf.estimated_savings(), Money::from_cents(80));
    }

    #[test]
    fn test_failed_write_changes_nothing() {
        let mut wf = RecommendationWorkflow::load(BrokenStore);
        wf.load_snapshot(food_and_transport());

        assert!(wf.apply(&cat("Food")).is_err());
        assert!(wf.is_pending(&cat("Food")));
        assert_eq!(wf.estimated_savings(), Money::ZERO);

        assert!(wf.apply_all().is_err());
        assert_eq!(wf.pending().len(), 2);
        assert!(wf.applied().is_empty());
    }

    #[test]
    fn test_selection_survives_reload() {
        let store = MemoryStore::new();
        {
            let mut wf = RecommendationWorkflow::load(store.clone());
            wf.load_snapshot(food_and_transport());
            wf.apply(&cat("Food")).unwrap();
        }

        let mut wf = RecommendationWorkflow::load(store);
        assert_eq!(wf.estimated_savings(), Money::from_major(2500.0));

        wf.load_snapshot(food_and_transport());
        assert_eq!(wf.pending().len(), 1);
        assert_eq!(wf.pending()[0].category, cat("Transport"));
    }

    #[test]
    fn test_refresh_resurfaces_ignored_but_not_applied() {
        let mut wf = workflow();
        wf.ignore(&cat("Transport"));
        wf.apply(&cat("Food")).unwrap();

        wf.load_snapshot(food_and_transport());
        assert_eq!(wf.pending().len(), 1);
        assert!(wf.is_pending(&cat("Transport")));
        assert!(wf.is_applied(&cat("Food")));
    }

    #[test]
    fn test_refresh_merges_against_state_at_completion() {
        let mut wf = workflow();
        let ticket = wf.begin_refresh();

        // User acts while the fetch is in flight
        wf.apply(&cat("Food")).unwrap();

        let outcome = wf.complete_refresh(ticket, Ok(food_and_transport()));
        assert!(outcome.is_updated());
        assert!(!wf.is_pending(&cat("Food")));
        assert!(wf.is_applied(&cat("Food")));
    }

    #[test]
    fn test_stale_refresh_is_dropped() {
        let mut wf = RecommendationWorkflow::load(MemoryStore::new());
        let older = wf.begin_refresh();
        let newer = wf.begin_refresh();

        let fresh = snapshot(10000.0, &[("Food", 2500.0)]);
        assert!(wf.complete_refresh(newer, Ok(fresh.clone())).is_updated());

        let outcome = wf.complete_refresh(older, Ok(food_and_transport()));
        assert!(matches!(outcome, RefreshOutcome::Stale));
        assert_eq!(wf.snapshot(), Some(&fresh));
        assert_eq!(wf.pending().len(), 1);
    }

    #[test]
    fn test_failed_refresh_keeps_prior_state() {
        let mut wf = workflow();
        wf.ignore(&cat("Transport"));
        let pending = wf.pending().to_vec();

        let ticket = wf.begin_refresh();
        let outcome = wf.complete_refresh(
            ticket,
            Err(Error::Api {
                status: 503,
                message: "down".into(),
            }),
        );

        assert!(matches!(outcome, RefreshOutcome::Failed(Error::Api { status: 503, .. })));
        assert_eq!(wf.pending(), pending.as_slice());
        assert_eq!(wf.snapshot(), Some(&food_and_transport()));
    }

    #[test]
    fn test_reset_returns_applied_to_pending() {
        let mut wf = workflow();
        wf.apply_all().unwrap();

        wf.reset().unwrap();
        assert_eq!(wf.estimated_savings(), Money::ZERO);
        assert!(wf.applied().is_empty());
        assert_eq!(wf.pending().len(), 2);
        assert!(SelectionState::load(wf.store()).is_empty());
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let mut wf = workflow();
        wf.apply(&cat("Food")).unwrap();

        assert_eq!(wf.resolve("Food"), Some(cat("Food")));
        assert_eq!(wf.resolve("food"), Some(cat("Food")));
        assert_eq!(wf.resolve(" TRANSPORT "), Some(cat("Transport")));
        assert_eq!(wf.resolve("rent"), None);
    }

    #[tokio::test]
    async fn test_refresh_from_source() {
        let mut wf = RecommendationWorkflow::load(MemoryStore::new());

        let outcome = wf.refresh(&FixedSource(Some(food_and_transport()))).await;
        assert!(matches!(outcome, RefreshOutcome::Updated { pending: 2 }));
        assert!(wf.fetched_at().is_some());

        let outcome = wf.refresh(&FixedSource(None)).await;
        assert!(matches!(outcome, RefreshOutcome::Failed(_)));
        assert_eq!(wf.pending().len(), 2);
    }
}
