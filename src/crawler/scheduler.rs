//! Scheduler for pending requests and politeness throttling
//!
//! This module handles:
//! - The queue of requests waiting to be fetched
//! - Global concurrency limiting via a semaphore
//! - Spacing request starts by the download delay
//! - Integrating the robots.txt crawl delay

use crate::config::CrawlerConfig;
use crate::crawler::controller::CrawlRequest;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// A request released for fetching
///
/// The fetch must not start before `not_before`; the permit holds one of the
/// concurrency slots until it is dropped.
pub struct ScheduledRequest {
    /// The request to fetch
    pub request: CrawlRequest,

    /// Earliest start time honoring the download delay
    pub not_before: Instant,

    /// The semaphore permit for this fetch
    pub permit: OwnedSemaphorePermit,
}

/// Scheduler manages the pending queue and request pacing
///
/// The scheduler coordinates:
/// - Global concurrency limits (max requests in flight)
/// - The minimum delay between request starts, optionally jittered
/// - FIFO order of pending requests
pub struct Scheduler {
    /// Semaphore limiting requests in flight
    semaphore: Arc<Semaphore>,

    /// Requests waiting to be fetched
    pending: VecDeque<CrawlRequest>,

    /// Base delay between request starts
    download_delay: Duration,

    /// Jitter the delay between 0.5x and 1.5x
    randomize: bool,

    /// Earliest start time of the next request
    next_slot: Option<Instant>,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `crawl_delay` - Crawl delay requested by robots.txt, if any
    ///
    /// The effective delay is the larger of the configured download delay
    /// and the robots.txt crawl delay.
    pub fn new(config: &CrawlerConfig, crawl_delay: Option<Duration>) -> Self {
        let max_in_flight = config.concurrent_requests.max(1) as usize;
        let configured = Duration::from_millis(config.download_delay_ms);

        Self {
            semaphore: Arc::new(Semaphore::new(max_in_flight)),
            pending: VecDeque::new(),
            download_delay: configured.max(crawl_delay.unwrap_or(Duration::ZERO)),
            randomize: config.randomize_download_delay,
            next_slot: None,
        }
    }

    /// Adds a request to the back of the queue
    pub fn enqueue(&mut self, request: CrawlRequest) {
        self.pending.push_back(request);
    }

    /// Releases the next request if a concurrency slot is free
    ///
    /// # Returns
    ///
    /// * `Some(ScheduledRequest)` - The next request with its start time and permit
    /// * `None` - The queue is empty or every slot is taken
    pub fn try_next(&mut self, now: Instant) -> Option<ScheduledRequest> {
        if self.pending.is_empty() {
            return None;
        }

        let permit = self.semaphore.clone().try_acquire_owned().ok()?;
        let request = self.pending.pop_front()?;
        let not_before = self.reserve_slot(now);

        tracing::trace!("Releasing {} (start at {:?})", request.url, not_before);

        Some(ScheduledRequest {
            request,
            not_before,
            permit,
        })
    }

    /// Reserves the next start slot and advances the pacing clock
    fn reserve_slot(&mut self, now: Instant) -> Instant {
        let slot = match self.next_slot {
            Some(next) if next > now => next,
            _ => now,
        };
        self.next_slot = Some(slot + self.next_delay());
        slot
    }

    /// The delay before the request after this one
    fn next_delay(&self) -> Duration {
        if self.randomize && !self.download_delay.is_zero() {
            self.download_delay.mul_f64(rand::random_range(0.5..1.5))
        } else {
            self.download_delay
        }
    }

    /// Number of requests waiting in the queue
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// The effective base delay between request starts
    pub fn download_delay(&self) -> Duration {
        self.download_delay
    }
}
