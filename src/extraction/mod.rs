//! Text and metadata extraction from uploaded files.
//!
//! The [`Extractor`] trait is the seam between the lifecycle code and the
//! parsing libraries. [`LocalExtractor`] is the real implementation; tests
//! substitute their own.

mod pdf;
mod spreadsheet;
#[cfg(test)]
pub(crate) mod testing;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors from extracting content out of a file.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("workbook has no worksheets")]
    NoWorksheets,

    #[error("extraction task failed: {0}")]
    Task(String),
}

/// First worksheet of a workbook as header names plus string rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TabularData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Extracts content from stored files.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Number of pages in a PDF.
    async fn page_count(&self, path: &Path) -> Result<u32, ExtractionError>;

    /// Page-labelled text of a PDF.
    ///
    /// Each page renders as `--- Page N ---`, the page text, then a blank line.
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractionError>;

    /// First worksheet of a workbook as a table.
    async fn read_tabular(&self, path: &Path) -> Result<TabularData, ExtractionError>;

    /// Summary of a workbook: file name and sheet count, then each sheet's
    /// name, dimensions, row and column counts.
    async fn workbook_summary(&self, path: &Path) -> Result<String, ExtractionError>;

    /// Like [`extract_text`](Self::extract_text), but never fails.
    ///
    /// Errors are rendered into the returned text instead.
    async fn text_or_message(&self, path: &Path) -> String {
        match self.extract_text(path).await {
            Ok(text) => text,
            Err(e) => format!("Error extracting text: {}", e),
        }
    }
}

/// Extractor backed by lopdf, pdf-extract and calamine.
///
/// Parsing is CPU-bound and runs on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct LocalExtractor;

impl LocalExtractor {
    pub fn new() -> Self {
        Self
    }
}

async fn blocking<T, F>(path: &Path, f: F) -> Result<T, ExtractionError>
where
    T: Send + 'static,
    F: FnOnce(PathBuf) -> Result<T, ExtractionError> + Send + 'static,
{
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || f(path))
        .await
        .map_err(|e| ExtractionError::Task(e.to_string()))?
}

#[async_trait]
impl Extractor for LocalExtractor {
    async fn page_count(&self, path: &Path) -> Result<u32, ExtractionError> {
        blocking(path, |p| pdf::page_count(&p)).await
    }

    async fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        blocking(path, |p| pdf::extract_text(&p)).await
    }

    async fn read_tabular(&self, path: &Path) -> Result<TabularData, ExtractionError> {
        blocking(path, |p| spreadsheet::read_tabular(&p)).await
    }

    async fn workbook_summary(&self, path: &Path) -> Result<String, ExtractionError> {
        blocking(path, |p| spreadsheet::workbook_summary(&p)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_text_or_message_embeds_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let text = LocalExtractor::new().text_or_message(&path).await;
        assert!(text.starts_with("Error extracting text: "));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let extractor = LocalExtractor::new();
        let missing = dir.path().join("nope.xlsx");

        assert!(extractor.page_count(&missing).await.is_err());
        assert!(extractor.read_tabular(&missing).await.is_err());
        assert!(extractor.workbook_summary(&missing).await.is_err());
    }
}
