//! Output module for the record feed and crawl statistics
//!
//! This module handles:
//! - Locating the feed file for a crawl run
//! - Writing records as CSV
//! - Recording crawl statistics

mod csv_output;
pub mod stats;
mod traits;

pub use csv_output::CsvSink;
pub use stats::{log_statistics, CrawlStatistics};
pub use traits::{ExportValue, Exportable, OutputError, OutputResult, RecordSink};

use crate::config::OutputConfig;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Timestamp format of the per-run output directory
pub const FEED_TIMESTAMP_FORMAT: &str = "%Y_%m_%d_T%H_%M_%S";

/// Path of the feed file for a crawl started at `started_at`
///
/// The feed lives in a directory named after the UTC start time, e.g.
/// `./output/2024_03_05_T14_07_09/atc.csv`.
///
/// # Example
///
/// ```
/// use atc_spider::config::OutputConfig;
/// use atc_spider::output::feed_path;
/// use chrono::{TimeZone, Utc};
///
/// let started = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
/// let path = feed_path(&OutputConfig::default(), started);
/// assert!(path.ends_with("2024_03_05_T14_07_09/atc.csv"));
/// ```
pub fn feed_path(config: &OutputConfig, started_at: DateTime<Utc>) -> PathBuf {
    PathBuf::from(&config.directory)
        .join(started_at.format(FEED_TIMESTAMP_FORMAT).to_string())
        .join(&config.file_name)
}
