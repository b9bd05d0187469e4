//! Applied recommendations and the running savings total
//!
//! `SelectionState` is the only workflow state that outlives a single
//! snapshot fetch. The total is maintained incrementally on every insert and
//! remove so it always equals the sum over the applied set, independent of
//! whatever snapshot is currently loaded.

use tracing::warn;

use crate::error::Result;
use crate::models::Money;
use crate::store::KeyValueStore;

use super::types::{CategoryId, Recommendation};

/// Store key for the JSON array of applied recommendations
pub const SELECTED_KEY: &str = "recommendations.selected";
/// Store key for the running savings total (decimal, major units)
pub const SAVINGS_KEY: &str = "recommendations.estimated_savings";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    applied: Vec<Recommendation>,
    estimated_savings: Money,
}

impl SelectionState {
    /// Build from persisted parts, repairing anything inconsistent
    ///
    /// Duplicate categories collapse to the first entry. A total that
    /// disagrees with the set is replaced by the set's sum.
    pub fn from_parts(applied: Vec<Recommendation>, persisted_total: Option<Money>) -> Self {
        let mut state = Self::default();
        for rec in applied {
            let category = rec.category.clone();
            if !state.insert(rec) {
                warn!("Dropping duplicate applied recommendation for {}", category);
            }
        }

        if let Some(total) = persisted_total {
            if total != state.estimated_savings {
                warn!(
                    "Stored savings total {} does not match applied set ({}); using applied set",
                    total, state.estimated_savings
                );
            }
        }

        state
    }

    /// Applied recommendations, in the order they were applied
    pub fn applied(&self) -> &[Recommendation] {
        &self.applied
    }

    pub fn estimated_savings(&self) -> Money {
        self.estimated_savings
    }

    pub fn len(&self) -> usize {
        self.applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    pub fn contains(&self, category: &CategoryId) -> bool {
        self.get(category).is_some()
    }

    pub fn get(&self, category: &CategoryId) -> Option<&Recommendation> {
        self.applied.iter().find(|r| &r.category == category)
    }

    /// Add a recommendation as applied; returns false if its category is
    /// already present
    pub fn insert(&mut self, rec: Recommendation) -> bool {
        if self.contains(&rec.category) {
            return false;
        }
        self.estimated_savings += rec.potential_savings;
        self.applied.push(rec.with_applied(true));
        true
    }

    /// Remove a category, returning it with `applied = false`
    pub fn remove(&mut self, category: &CategoryId) -> Option<Recommendation> {
        let index = self.applied.iter().position(|r| &r.category == category)?;
        let rec = self.applied.remove(index);
        self.estimated_savings -= rec.potential_savings;
        Some(rec.with_applied(false))
    }

    /// Load from the store
    ///
    /// Missing keys, unreadable values or a failing store all yield an empty
    /// state; the workflow must be able to start regardless.
    pub fn load(store: &impl KeyValueStore) -> Self {
        let applied = match store.get(SELECTED_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<Recommendation>>(&json) {
                Ok(recs) => recs,
                Err(e) => {
                    warn!("Ignoring unreadable applied recommendations: {}", e);
                    return Self::default();
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read applied recommendations: {}", e);
                return Self::default();
            }
        };

        let total = match store.get(SAVINGS_KEY) {
            Ok(Some(raw)) => raw.parse::<Money>().ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read savings total: {}", e);
                None
            }
        };

        Self::from_parts(applied, total)
    }

    /// Persist both keys in one store write
    pub fn save(&self, store: &impl KeyValueStore) -> Result<()> {
        let json = serde_json::to_string(&self.applied)?;
        let total = self.estimated_savings.to_string();
        store.set_many(&[(SELECTED_KEY, json.as_str()), (SAVINGS_KEY, total.as_str())])
    }

    /// Remove both keys from the store
    pub fn clear(store: &impl KeyValueStore) -> Result<()> {
        store.remove(SELECTED_KEY)?;
        store.remove(SAVINGS_KEY)
    }
}
