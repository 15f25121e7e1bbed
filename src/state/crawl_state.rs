//! Crawl lifecycle states
//!
//! A crawl starts `Running` and ends in exactly one terminal state, which
//! becomes the close reason reported to observers and logs.

use std::fmt;

/// Represents the current state of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Active State =====
    /// Requests are pending or in flight
    Running,

    // ===== Terminal States =====
    /// No pending or in-flight requests remain
    Finished,

    /// The total crawl time ceiling was exceeded
    TimedOut,

    /// No record was produced within the idle window
    Stalled,

    /// The error budget was used up
    ErrorLimitExceeded,

    /// The user interrupted the crawl
    UserStopped,
}

impl CrawlState {
    /// Returns true if a close-spider limit ended the crawl
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            Self::TimedOut | Self::Stalled | Self::ErrorLimitExceeded
        )
    }

    /// The close reason string for this state
    ///
    /// These are the reason names used in logs and statistics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Finished => "finished",
            Self::TimedOut => "closespider_timeout",
            Self::Stalled => "closespider_timeout_no_item",
            Self::ErrorLimitExceeded => "closespider_errorcount",
            Self::UserStopped => "shutdown",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason())
    }
}
