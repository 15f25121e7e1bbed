use crate::crawler::CrawlRequest;
use crate::report::CrawlObserver;
use crate::state::CrawlState;
use crate::AtcError;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const PROGRESS_MESSAGE: &str = "Scraping Progress";
const PROGRESS_TEMPLATE: &str = "{spinner:.green} {msg}: {pos:.green} ATC codes [{elapsed_precise}, {per_sec}]";

/// Spinner counting downloaded pages
///
/// A page counts once its response arrives, whether or not it extracts.
/// The total is unknown up front, so this is a spinner rather than a bar.
/// When disabled the spinner is hidden but still counts.
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Creates the reporter; a disabled one draws nothing
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };

        let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(PROGRESS_MESSAGE);

        if enabled {
            bar.enable_steady_tick(Duration::from_millis(120));
        }

        Self { bar }
    }

    /// Pages counted so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Whether the spinner has been cleared
    pub fn is_closed(&self) -> bool {
        self.bar.is_finished()
    }

    fn close(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl CrawlObserver for ProgressReporter {
    fn on_response(&mut self, _request: &CrawlRequest) {
        self.bar.inc(1);
    }

    fn on_idle(&mut self) {
        self.close();
    }

    fn on_closed(&mut self, _state: CrawlState) {
        self.close();
    }

    fn on_aborted(&mut self, _error: &AtcError) {
        self.close();
    }
}
