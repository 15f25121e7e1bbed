//! Crawler module for fetching and walking the index
//!
//! This module contains the core crawling logic, including:
//! - Link and text extraction from index pages
//! - Recursion control (child requests, depth and domain bounds)
//! - HTTP fetching with retry logic
//! - Request scheduling and download delay
//! - Overall crawl coordination

mod controller;
mod coordinator;
mod extractor;
mod fetcher;
mod scheduler;

pub use controller::{ChildPlan, CrawlRequest, RecursionController};
pub use coordinator::{run_crawl, Coordinator, CrawlOutcome};
pub use extractor::{extract, ChildLink, ClassificationRecord, Extractor, PageNode};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use scheduler::{ScheduledRequest, Scheduler};
