/// Page and crawl state definitions for tracking crawl progress
///
/// A fetched URL moves `Pending -> Fetching -> {Parsed | FetchFailed}`; the
/// crawl as a whole moves `Running -> Draining -> Done`.
use crate::ScoutError;
use std::fmt;

/// Represents the current state of a single URL in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Queued in the frontier, not yet dispatched
    Pending,

    /// Dispatched to the fetcher, response outstanding
    Fetching,

    // ===== Terminal States =====
    /// Fetched and routed to its parse stage
    Parsed,

    /// Fetch failed after retries were exhausted (includes timeouts)
    FetchFailed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Parsed | Self::FetchFailed)
    }

    /// Returns true if the URL may still be processed
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Parsed)
                | (Self::Fetching, Self::FetchFailed)
        )
    }

    /// Moves to `next`, rejecting transitions the state machine does not allow
    pub fn transition(self, next: PageState) -> Result<PageState, ScoutError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ScoutError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Returns a short lowercase label for logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Parsed => "parsed",
            Self::FetchFailed => "fetch_failed",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global state of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Frontier has work; new fetches are being dispatched
    Running,

    /// No new dispatches; waiting for in-flight fetches to settle
    Draining,

    /// Frontier empty and nothing in flight
    Done,
}

impl CrawlPhase {
    /// Advances the phase; phases only move forward
    pub fn advance(self, next: CrawlPhase) -> CrawlPhase {
        if next.rank() > self.rank() {
            tracing::debug!("Crawl phase {} -> {}", self, next);
            next
        } else {
            self
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Draining => 1,
            Self::Done => 2,
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        };
        f.write_str(label)
    }
}
