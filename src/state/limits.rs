use crate::config::CloseSpiderConfig;
use crate::state::CrawlState;
use std::time::{Duration, Instant};

/// Tracks the crawl-wide close conditions
///
/// This structure maintains the counters and timestamps needed to decide
/// when a running crawl has to stop early:
/// - total elapsed time against the crawl timeout
/// - time since the last record against the idle timeout
/// - failed requests and pages against the error budget
#[derive(Debug, Clone)]
pub struct CloseSpiderMonitor {
    /// Total crawl time ceiling (None = unlimited)
    timeout: Option<Duration>,

    /// Maximum time without a record (None = unlimited)
    idle_timeout: Option<Duration>,

    /// Error budget (None = unlimited)
    error_limit: Option<u32>,

    /// When the crawl started
    started_at: Instant,

    /// When the last record was produced (crawl start until the first one)
    last_item_at: Instant,

    /// Errors counted so far
    error_count: u32,
}

impl CloseSpiderMonitor {
    /// Creates a monitor for a crawl starting at `now`
    pub fn new(config: &CloseSpiderConfig, now: Instant) -> Self {
        let non_zero = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

        Self {
            timeout: non_zero(config.timeout_secs),
            idle_timeout: non_zero(config.timeout_no_item_secs),
            error_limit: (config.error_count > 0).then_some(config.error_count),
            started_at: now,
            last_item_at: now,
            error_count: 0,
        }
    }

    /// Records that a record was produced at `now`
    pub fn record_item(&mut self, now: Instant) {
        self.last_item_at = now;
    }

    /// Records a failed request or page and returns the new error count
    pub fn record_error(&mut self) -> u32 {
        self.error_count += 1;
        self.error_count
    }

    /// Checks every close condition at `now`
    ///
    /// # Returns
    ///
    /// * `Some(CrawlState)` - The terminal state of the first condition hit
    /// * `None` - The crawl may keep running
    pub fn check(&self, now: Instant) -> Option<CrawlState> {
        if let Some(limit) = self.error_limit {
            if self.error_count >= limit {
                return Some(CrawlState::ErrorLimitExceeded);
            }
        }

        if let Some(timeout) = self.timeout {
            if now.saturating_duration_since(self.started_at) >= timeout {
                return Some(CrawlState::TimedOut);
            }
        }

        if let Some(idle) = self.idle_timeout {
            if now.saturating_duration_since(self.last_item_at) >= idle {
                return Some(CrawlState::Stalled);
            }
        }

        None
    }

    /// The earliest instant at which a time-based condition fires
    ///
    /// Returns the instant together with the state it would produce, or
    /// `None` when both time limits are disabled. A limit too large to be
    /// represented as an `Instant` never fires.
    pub fn next_deadline(&self) -> Option<(Instant, CrawlState)> {
        let crawl_deadline = self
            .timeout
            .and_then(|t| self.started_at.checked_add(t))
            .map(|at| (at, CrawlState::TimedOut));
        let idle_deadline = self
            .idle_timeout
            .and_then(|t| self.last_item_at.checked_add(t))
            .map(|at| (at, CrawlState::Stalled));

        match (crawl_deadline, idle_deadline) {
            (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
            (a, b) => a.or(b),
        }
    }
}
