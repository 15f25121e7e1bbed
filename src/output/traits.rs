//! Output sink traits and types
//!
//! This module defines the trait interface for record sinks and the
//! value model used when exporting records as columns.

use crate::crawler::ClassificationRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A single exported field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportValue {
    /// A plain value
    Single(String),

    /// Several values exported into one column
    Multi(Vec<String>),
}

impl ExportValue {
    /// Renders the value for a single column, joining multiple values with
    /// `separator`
    pub fn render(&self, separator: &str) -> String {
        match self {
            Self::Single(value) => value.clone(),
            Self::Multi(values) => values.join(separator),
        }
    }
}

/// Something that can be written as one row of a feed
pub trait Exportable {
    /// Column names, in order
    fn headers() -> &'static [&'static str];

    /// Field values, in the same order as [`Exportable::headers`]
    fn values(&self) -> Vec<ExportValue>;
}

impl Exportable for ClassificationRecord {
    fn headers() -> &'static [&'static str] {
        &["atc_code", "atc_value"]
    }

    fn values(&self) -> Vec<ExportValue> {
        vec![
            ExportValue::Single(self.code.clone()),
            ExportValue::Single(self.label.clone()),
        ]
    }
}

/// Trait for record sinks
///
/// A sink receives every record as soon as it is extracted. The coordinator
/// owns its sink and drives it from a single task.
pub trait RecordSink: Send {
    /// Writes one record
    ///
    /// # Arguments
    ///
    /// * `record` - The record to write
    fn write_record(&mut self, record: &ClassificationRecord) -> OutputResult<()>;

    /// Flushes everything written so far
    ///
    /// Called once when the crawl closes, whatever the reason.
    fn finish(&mut self) -> OutputResult<()>;

    /// Number of records written
    fn records_written(&self) -> u64;
}
