//! Candidate derivation from an insights snapshot
//!
//! Pure functions: no I/O, no persistence. One candidate per key of the
//! snapshot's `categoryRecommendations` map.

use crate::models::{InsightsSnapshot, Money};

use super::selection::SelectionState;
use super::types::{CategoryId, HintLevel, Impact, Recommendation};

/// Share of income spent, clamped to 0..=100
///
/// Zero or negative income yields 0 rather than dividing by zero.
pub fn percent_of_income(expense: f64, total_income: f64) -> f64 {
    if total_income <= 0.0 || !total_income.is_finite() {
        return 0.0;
    }
    let percent = expense * 100.0 / total_income;
    if !percent.is_finite() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0)
}

/// Build a recommendation for one category
pub fn recommendation_for(
    snapshot: &InsightsSnapshot,
    category: CategoryId,
    suggestion: &str,
) -> Recommendation {
    let spent = snapshot.expense_for(category.as_key());
    let percent = percent_of_income(spent, snapshot.total_income);
    let hint_level = HintLevel::from_percent(percent);

    Recommendation {
        hint: hint_level.text(&category),
        category,
        suggestion: suggestion.to_string(),
        hint_level,
        impact: Impact::from_percent(percent),
        potential_savings: Money::from_major(spent),
        percent_of_income: percent,
        applied: false,
    }
}

/// Every candidate recommendation in the snapshot
pub fn candidates(snapshot: &InsightsSnapshot) -> Vec<Recommendation> {
    snapshot
        .category_recommendations
        .iter()
        .map(|(key, suggestion)| {
            recommendation_for(snapshot, CategoryId::new(key.as_str()), suggestion)
        })
        .collect()
}

/// Candidates not already applied in `selection`
pub fn pending(snapshot: &InsightsSnapshot, selection: &SelectionState) -> Vec<Recommendation> {
    candidates(snapshot)
        .into_iter()
        .filter(|rec| !selection.contains(&rec.category))
        .collect()
}
