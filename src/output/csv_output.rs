//! CSV feed writer

use crate::crawler::ClassificationRecord;
use crate::output::traits::{Exportable, OutputResult, RecordSink};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Writes records to a CSV file, one row per record
pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    separator: String,
    written: u64,
}

impl CsvSink {
    /// Creates the feed file, truncating any existing one, and writes the
    /// header row
    ///
    /// Missing parent directories are created.
    ///
    /// # Arguments
    ///
    /// * `path` - Where to write the feed
    /// * `separator` - Joins multi-valued fields
    pub fn create(path: &Path, separator: &str) -> OutputResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(ClassificationRecord::headers())?;

        tracing::debug!("Writing feed to {}", path.display());

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            separator: separator.to_string(),
            written: 0,
        })
    }

    /// Path of the feed file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvSink {
    fn write_record(&mut self, record: &ClassificationRecord) -> OutputResult<()> {
        let row: Vec<String> = record
            .values()
            .iter()
            .map(|value| value.render(&self.separator))
            .collect();
        self.writer.write_record(&row)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        tracing::debug!(
            "Flushed {} records to {}",
            self.written,
            self.path.display()
        );
        Ok(())
    }

    fn records_written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("atc.csv");

        let mut sink = CsvSink::create(&path, "; ").unwrap();
        sink.write_record(&ClassificationRecord::new("A", "ALIMENTARY TRACT AND METABOLISM"))
            .unwrap();
        sink.write_record(&ClassificationRecord::new("A01AA01", "Etofenamate"))
            .unwrap();
        sink.finish().unwrap();

        assert_eq!(sink.records_written(), 2);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "atc_code,atc_value\nA,ALIMENTARY TRACT AND METABOLISM\nA01AA01,Etofenamate\n"
        );
    }

    #[test]
    fn test_labels_are_quoted_when_needed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("atc.csv");

        let mut sink = CsvSink::create(&path, "; ").unwrap();
        sink.write_record(&ClassificationRecord::new("A01AB", "Antiinfectives, local"))
            .unwrap();
        sink.finish().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("A01AB,\"Antiinfectives, local\"\n"));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("run").join("atc.csv");

        let mut sink = CsvSink::create(&path, "; ").unwrap();
        sink.finish().unwrap();

        assert!(path.exists());
        assert_eq!(sink.path(), path.as_path());
    }

    #[test]
    fn test_existing_file_is_truncated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("atc.csv");
        fs::write(&path, "stale contents\nfrom an earlier run\n").unwrap();

        let mut sink = CsvSink::create(&path, "; ").unwrap();
        sink.finish().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "atc_code,atc_value\n");
    }
}
