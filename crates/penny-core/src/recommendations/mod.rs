//! Recommendation workflow
//!
//! Turns the backend's insights snapshot into per-category spending
//! recommendations and tracks what the user does with them.
//!
//! ## Pieces
//!
//! - `derive` - pure candidate derivation (percent of income, impact, hint)
//! - `selection` - applied set + running savings total, persisted
//! - `workflow` - apply / ignore / apply-all / undo over pending and applied
//! - `refresh` - ticketed snapshot refreshes that never clobber newer data
//!
//! ## Usage
//!
//! ```rust,ignore
//! use penny_core::recommendations::RecommendationWorkflow;
//!
//! let mut workflow = RecommendationWorkflow::load(db);
//! workflow.refresh(&client).await;
//! if let Some(food) = workflow.resolve("food") {
//!     workflow.apply(&food)?;
//! }
//! ```

pub mod derive;
pub mod refresh;
pub mod selection;
pub mod types;
pub mod workflow;

pub use refresh::{InsightsSource, RefreshOutcome, RefreshSequencer, RefreshTicket};
pub use selection::{SelectionState, SAVINGS_KEY, SELECTED_KEY};
pub use types::{CategoryId, HintLevel, Impact, Recommendation};
pub use workflow::RecommendationWorkflow;
