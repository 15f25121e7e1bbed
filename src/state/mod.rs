//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: The crawl lifecycle (running, then one terminal close reason)
//! - `CloseSpiderMonitor`: Time, idle and error-budget limits that end a crawl early

mod crawl_state;
mod limits;

// Re-export main types
pub use crawl_state::CrawlState;
pub use limits::CloseSpiderMonitor;
