//! Core types for the recommendation workflow

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Money;

/// Opaque category key
///
/// Wraps the backend's category key as-is. Used for identity only; display
/// text comes from [`CategoryId::display_name`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Backend key, for lookups into snapshot maps
    pub fn as_key(&self) -> &str {
        &self.0
    }

    /// Text shown to the user
    pub fn display_name(&self) -> &str {
        self.0.trim()
    }
}

impl Borrow<str> for CategoryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CategoryId {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CategoryId {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// How much a recommendation matters, by share of income
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    /// High above 15% of income, Medium above 5%, otherwise Low
    pub fn from_percent(percent: f64) -> Self {
        if percent > 15.0 {
            Impact::High
        } else if percent > 5.0 {
            Impact::Medium
        } else {
            Impact::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Low => "Low",
            Impact::Medium => "Medium",
            Impact::High => "High",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Urgency of the hint line; a separate ladder from [`Impact`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintLevel {
    /// Above 20% of income
    ReduceImmediately,
    /// Above 10% of income
    TryReducing,
    OptionalOptimize,
}

impl HintLevel {
    pub fn from_percent(percent: f64) -> Self {
        if percent > 20.0 {
            HintLevel::ReduceImmediately
        } else if percent > 10.0 {
            HintLevel::TryReducing
        } else {
            HintLevel::OptionalOptimize
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HintLevel::ReduceImmediately => "reduce_immediately",
            HintLevel::TryReducing => "try_reducing",
            HintLevel::OptionalOptimize => "optional_optimize",
        }
    }

    /// Hint sentence for a category
    pub fn text(&self, category: &CategoryId) -> String {
        match self {
            HintLevel::ReduceImmediately => {
                format!("Immediately reduce spending on {}", category)
            }
            HintLevel::TryReducing => {
                format!("Try reducing {} expenses for better savings", category)
            }
            HintLevel::OptionalOptimize => format!("Optional: Optimize {} if possible", category),
        }
    }
}

impl fmt::Display for HintLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A per-category spending recommendation derived from a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: CategoryId,
    pub suggestion: String,
    pub hint: String,
    pub hint_level: HintLevel,
    pub impact: Impact,
    pub potential_savings: Money,
    /// Share of total income, clamped to 0..=100
    pub percent_of_income: f64,
    #[serde(default)]
    pub applied: bool,
}

impl Recommendation {
    /// Copy of this recommendation with the applied flag set
    pub fn with_applied(mut self, applied: bool) -> Self {
        self.applied = applied;
        self
    }
}
