//! Append-only CSV output.
//!
//! Each page's rows are serialized in memory and appended in one write; the
//! file is opened and closed per batch so a crash never leaves a handle open
//! and the file always ends on a complete record.

use crate::models::ReviewRow;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode row: {0}")]
    Csv(#[from] csv::Error),
}

/// Destination file for scraped rows.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `rows` to the file, creating it if needed.
    ///
    /// An empty batch leaves the file untouched. Returns the number of rows
    /// written.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), rows = rows.len()))]
    pub async fn append(&self, rows: &[ReviewRow]) -> Result<usize, OutputError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let bytes = encode(rows)?;
        let io_err = |source: std::io::Error| OutputError::Io {
            path: self.path.display().to_string(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_err)?;
        file.write_all(&bytes).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        debug!(bytes = bytes.len(), "Appended rows");
        Ok(rows.len())
    }
}

/// Serialize rows as header-less CSV.
pub fn encode(rows: &[ReviewRow]) -> Result<Vec<u8>, OutputError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| OutputError::Csv(csv::Error::from(e.into_error())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(artist: &str, review: &str) -> ReviewRow {
        ReviewRow {
            artist: artist.to_string(),
            album: "Album".to_string(),
            review_text: review.to_string(),
            date: "Jan 1 2021".to_string(),
            rating: "4.00 stars".to_string(),
            username: "user".to_string(),
            detected_language: "en".to_string(),
        }
    }

    fn read_back(path: &Path) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap()
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_encode_quotes_embedded_delimiters() {
        let bytes = encode(&[row("Crosby, Stills & Nash", "line one\nline two")]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("\"Crosby, Stills & Nash\",Album,\"line one\nline two\""));
    }

    #[tokio::test]
    async fn test_append_accumulates_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().join("rows.csv"));

        assert_eq!(sink.append(&[row("A", "one"), row("B", "two")]).await.unwrap(), 2);
        assert_eq!(sink.append(&[row("C", "three")]).await.unwrap(), 1);

        let records = read_back(sink.path());
        assert_eq!(records.len(), 3);
        assert_eq!(records[0][0], "A");
        assert_eq!(records[2][0], "C");
        assert_eq!(records[2].len(), 7);
    }

    #[tokio::test]
    async fn test_empty_batch_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().join("rows.csv"));
        assert_eq!(sink.append(&[]).await.unwrap(), 0);
        assert!(!sink.path().exists());
    }

    #[tokio::test]
    async fn test_append_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().join("missing").join("rows.csv"));
        let err = sink.append(&[row("A", "one")]).await.unwrap_err();
        assert!(matches!(err, OutputError::Io { .. }));
    }
}
