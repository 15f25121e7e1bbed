use crate::report::CrawlObserver;
use crate::state::CrawlState;

/// Logs one line when the crawl closes
#[derive(Debug, Default)]
pub struct LifecycleLogger;

impl LifecycleLogger {
    pub fn new() -> Self {
        Self
    }
}

impl CrawlObserver for LifecycleLogger {
    fn on_closed(&mut self, state: CrawlState) {
        tracing::info!("{}", close_message(state));
    }
}

/// The line logged for a close reason
pub fn close_message(state: CrawlState) -> String {
    match state {
        CrawlState::Finished => "Scraping finished successfully.".to_string(),
        CrawlState::UserStopped => "Scraping was stopped by user.".to_string(),
        other => format!("Scraping finished with reason: {}", other.reason()),
    }
}
