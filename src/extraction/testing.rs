//! Scripted extractor for lifecycle, sweep and intake tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{ExtractionError, Extractor, TabularData};
use crate::models::DocumentStatus;
use crate::repository::{DbContext, DocumentFilter};

/// Extractor that never touches the file system.
///
/// Paths containing any of the `failing` fragments fail; everything else
/// succeeds with canned output.
#[derive(Default)]
pub struct ScriptedExtractor {
    pages: Option<u32>,
    failing: Vec<String>,
    observe: Option<DbContext>,
    cancel: Option<CancellationToken>,
    calls: Mutex<Vec<PathBuf>>,
    observed: Mutex<Vec<DocumentStatus>>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self {
            pages: Some(1),
            ..Default::default()
        }
    }

    /// `None` makes `page_count` fail.
    pub fn with_pages(mut self, pages: Option<u32>) -> Self {
        self.pages = pages;
        self
    }

    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.failing.push(fragment.to_string());
        self
    }

    /// Record the stored status of the document being extracted.
    pub fn observing(mut self, ctx: DbContext) -> Self {
        self.observe = Some(ctx);
        self
    }

    /// Cancel the token as soon as the first extraction starts.
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }

    pub fn observed(&self) -> Vec<DocumentStatus> {
        self.observed.lock().unwrap().clone()
    }

    async fn run(&self, path: &Path) -> Result<(), ExtractionError> {
        self.calls.lock().unwrap().push(path.to_path_buf());

        if let Some(token) = &self.cancel {
            token.cancel();
        }

        if let Some(ctx) = &self.observe {
            let docs = ctx
                .documents()
                .list(&DocumentFilter::default())
                .await
                .unwrap();
            let statuses: Vec<DocumentStatus> = docs
                .iter()
                .filter(|d| path.ends_with(d.primary_path()))
                .map(|d| d.status)
                .collect();
            self.observed.lock().unwrap().extend(statuses);
        }

        let display = path.display().to_string();
        if self.failing.iter().any(|f| display.contains(f.as_str())) {
            return Err(ExtractionError::Pdf(format!("scripted failure for {}", display)));
        }
        Ok(())
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn page_count(&self, _path: &Path) -> Result<u32, ExtractionError> {
        self.pages
            .ok_or_else(|| ExtractionError::Pdf("unreadable page tree".into()))
    }

    async fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        self.run(path).await?;
        Ok("--- Page 1 ---\nscripted\n\n".to_string())
    }

    async fn read_tabular(&self, path: &Path) -> Result<TabularData, ExtractionError> {
        self.run(path).await?;
        Ok(TabularData {
            columns: vec!["a".into()],
            rows: vec![vec!["1".into()]],
        })
    }

    async fn workbook_summary(&self, path: &Path) -> Result<String, ExtractionError> {
        self.run(path).await?;
        Ok(concat!(
            "Workbook: sheet.xlsx\nWorksheets: 1\n\n",
            "Worksheet: Sheet1\nDimensions: A1:A2\nRows: 2\nColumns: 1\n\n",
        ).to_string())
    }
}
