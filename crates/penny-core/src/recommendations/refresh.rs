//! Snapshot refresh plumbing
//!
//! Fetching is async and may overlap with local edits, so each refresh is
//! issued a ticket. Completions are merged against the selection state that
//! is current when they resolve, and a completion older than one already
//! accepted is dropped.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::InsightsSnapshot;

/// Anything that can produce an insights snapshot
#[async_trait]
pub trait InsightsSource: Send + Sync {
    async fn fetch_insights(&self) -> Result<InsightsSnapshot>;
}

/// Sequence number handed out when a refresh starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

/// Result of completing a refresh
#[derive(Debug)]
pub enum RefreshOutcome {
    /// Snapshot replaced; `pending` is the new pending count
    Updated { pending: usize },
    /// A newer refresh already landed; this one was dropped
    Stale,
    /// Fetch failed; previous snapshot and pending list kept
    Failed(Error),
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, RefreshOutcome::Updated { .. })
    }
}

/// Issues tickets and decides which completions may be applied
///
/// Only successful completions advance the accepted sequence, so a failure
/// of a newer request does not block an older request that still succeeds.
#[derive(Debug, Default)]
pub struct RefreshSequencer {
    issued: u64,
    accepted: u64,
}

impl RefreshSequencer {
    pub fn issue(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    /// True if `ticket` is newer than every accepted completion
    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        ticket.0 > self.accepted
    }

    /// Record a successful completion; returns false if it is stale
    pub fn accept(&mut self, ticket: RefreshTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.accepted = ticket.0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_increase() {
        let mut seq = RefreshSequencer::default();
        let a = seq.issue();
        let b = seq.issue();
        assert!(b > a);
        assert!(seq.is_current(a) && seq.is_current(b));
    }

    #[test]
    fn test_older_completion_is_stale() {
        let mut seq = RefreshSequencer::default();
        let first = seq.issue();
        let second = seq.issue();

        assert!(seq.accept(second));
        assert!(!seq.accept(first));
        assert!(!seq.accept(second));
    }

    #[test]
    fn test_in_order_completions_accepted() {
        let mut seq = RefreshSequencer::default();
        let first = seq.issue();
        let second = seq.issue();

        assert!(seq.accept(first));
        assert!(seq.accept(second));
    }
}
