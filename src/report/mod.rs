//! Progress and lifecycle reporting
//!
//! Observers are registered with the coordinator and told about crawl
//! events. They only report; nothing they do affects the crawl.

mod lifecycle;
mod progress;

pub use lifecycle::{close_message, LifecycleLogger};
pub use progress::ProgressReporter;

use crate::crawler::{CrawlRequest, PageNode};
use crate::state::CrawlState;
use crate::AtcError;

/// Receives crawl events from the coordinator
///
/// All methods have empty default implementations, so an observer only
/// implements the events it cares about.
pub trait CrawlObserver: Send {
    /// A page was downloaded, before it is extracted
    fn on_response(&mut self, _request: &CrawlRequest) {}

    /// A page was extracted and its records written
    fn on_page_processed(&mut self, _page: &PageNode) {}

    /// Nothing is pending or in flight
    ///
    /// Delivered once, before the crawl closes as `Finished`.
    fn on_idle(&mut self) {}

    /// The crawl closed with `state`
    fn on_closed(&mut self, _state: CrawlState) {}

    /// The crawl stopped on an error before reaching a close state
    fn on_aborted(&mut self, _error: &AtcError) {}
}
