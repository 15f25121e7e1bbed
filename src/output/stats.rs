//! Crawl statistics
//!
//! Counters collected by the coordinator while the crawl runs, logged once
//! when it closes.

use crate::state::CrawlState;
use chrono::{DateTime, Utc};

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// When the crawl started
    pub started_at: DateTime<Utc>,

    /// When the crawl closed
    pub finished_at: Option<DateTime<Utc>>,

    /// Final (or current) crawl state
    pub state: CrawlState,

    /// Requests handed to the fetcher
    pub requests_sent: u64,

    /// Pages fetched and extracted successfully
    pub pages_processed: u64,

    /// Records written to the feed
    pub records: u64,

    /// Requests that failed after every retry
    pub request_failures: u64,

    /// Pages whose codes and labels did not line up
    pub structural_errors: u64,

    /// Fetch tasks that panicked or were cancelled
    pub task_failures: u64,

    /// Responses with a non-retryable error status
    pub http_ignored: u64,

    /// Requests skipped because robots.txt disallows them
    pub robots_denied: u64,

    /// Links not followed because of the depth limit
    pub depth_filtered: u64,

    /// Links pointing outside the allowed domains
    pub offsite_filtered: u64,

    /// Links that did not form a valid URL
    pub invalid_links: u64,
}

impl CrawlStatistics {
    /// Creates empty statistics for a crawl starting at `started_at`
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: None,
            state: CrawlState::Running,
            requests_sent: 0,
            pages_processed: 0,
            records: 0,
            request_failures: 0,
            structural_errors: 0,
            task_failures: 0,
            http_ignored: 0,
            robots_denied: 0,
            depth_filtered: 0,
            offsite_filtered: 0,
            invalid_links: 0,
        }
    }

    /// Marks the crawl as closed
    pub fn close(&mut self, state: CrawlState, at: DateTime<Utc>) {
        self.state = state;
        self.finished_at = Some(at);
    }

    /// Everything that counted against the error budget
    pub fn total_errors(&self) -> u64 {
        self.request_failures + self.structural_errors + self.task_failures
    }

    /// Requests that were never sent, for any reason
    pub fn total_filtered(&self) -> u64 {
        self.robots_denied + self.depth_filtered + self.offsite_filtered + self.invalid_links
    }

    /// Crawl duration in seconds, once closed
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Logs statistics at info level
///
/// # Arguments
///
/// * `stats` - The statistics to log
pub fn log_statistics(stats: &CrawlStatistics) {
    tracing::info!(
        "Crawl closed ({}): {} pages processed, {} records written, {} requests sent",
        stats.state,
        stats.pages_processed,
        stats.records,
        stats.requests_sent
    );
    tracing::info!(
        "Errors: {} total ({} failed requests, {} structural mismatches, {} task failures), {} ignored HTTP errors",
        stats.total_errors(),
        stats.request_failures,
        stats.structural_errors,
        stats.task_failures,
        stats.http_ignored
    );
    tracing::info!(
        "Filtered: {} total ({} by robots.txt, {} by depth, {} offsite, {} invalid)",
        stats.total_filtered(),
        stats.robots_denied,
        stats.depth_filtered,
        stats.offsite_filtered,
        stats.invalid_links
    );

    if let Some(seconds) = stats.duration_seconds() {
        tracing::info!("Elapsed: {}s", seconds);
    }
}
