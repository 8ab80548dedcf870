//! Outcome of a single crawl run.

use std::fmt;

/// Why a run stopped traversing the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// A page contained a posting already in the history
    HistoryReached,
    /// The last page had no next-page control
    EndOfListing,
    /// The next-page control pointed at a page already visited this run
    Revisited,
    /// `crawler.max_pages` listing pages were visited
    PageLimit,
    /// A listing fetch or storage operation failed
    Aborted { reason: String },
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::HistoryReached => write!(f, "reached known postings"),
            Termination::EndOfListing => write!(f, "end of listing"),
            Termination::Revisited => write!(f, "next page already visited"),
            Termination::PageLimit => write!(f, "page limit reached"),
            Termination::Aborted { reason } => write!(f, "aborted: {reason}"),
        }
    }
}

/// Summary returned to whoever triggered the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Postings persisted during this run
    pub new_posting_count: usize,
    /// Listing pages fetched successfully
    pub pages_visited: usize,
    /// New postings dropped because their detail page failed
    pub details_skipped: usize,
    /// Entries whose date text could not be normalized
    pub dates_rejected: usize,
    pub termination: Termination,
}

impl RunOutcome {
    /// Failure reason, if the run was aborted.
    pub fn failure(&self) -> Option<&str> {
        match &self.termination {
            Termination::Aborted { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_only_when_aborted() {
        let mut outcome = RunOutcome {
            new_posting_count: 3,
            pages_visited: 1,
            details_skipped: 0,
            dates_rejected: 0,
            termination: Termination::EndOfListing,
        };
        assert!(outcome.is_success());
        assert_eq!(outcome.failure(), None);

        outcome.termination = Termination::Aborted {
            reason: "timeout".to_string(),
        };
        assert_eq!(outcome.failure(), Some("timeout"));
        assert_eq!(outcome.termination.to_string(), "aborted: timeout");
    }
}
