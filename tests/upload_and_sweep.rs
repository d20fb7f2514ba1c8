//! End-to-end: uploads go in pending, a sweep drives them to a terminal
//! status, and comments follow their document.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use marginalia::extraction::{ExtractionError, Extractor, TabularData};
use marginalia::models::{Comment, DocumentStatus, FileKind};
use marginalia::repository::{CommentError, DbContext, DocumentFilter};
use marginalia::services::{IntakeError, LifecycleManager, UploadIntake, UploadLimits, ValidationError};
use marginalia::storage::BlobStore;
use marginalia::work_queue::{DbPendingQueue, SweepRunner};

/// Reads the stored bytes and treats anything starting with `BAD` as corrupt.
struct ContentExtractor;

async fn contents(path: &Path) -> Result<String, ExtractionError> {
    let text = String::from_utf8_lossy(&tokio::fs::read(path).await?).into_owned();
    if text.starts_with("BAD") {
        return Err(ExtractionError::Pdf("corrupt file".into()));
    }
    Ok(text)
}

#[async_trait]
impl Extractor for ContentExtractor {
    async fn page_count(&self, path: &Path) -> Result<u32, ExtractionError> {
        contents(path).await.map(|_| 3)
    }

    async fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        let text = contents(path).await?;
        Ok(format!("--- Page 1 ---\n{}\n\n", text))
    }

    async fn read_tabular(&self, path: &Path) -> Result<TabularData, ExtractionError> {
        let text = contents(path).await?;
        Ok(TabularData {
            columns: vec!["Column1".into()],
            rows: vec![vec![text]],
        })
    }

    async fn workbook_summary(&self, path: &Path) -> Result<String, ExtractionError> {
        contents(path).await?;
        Ok(concat!(
            "Workbook: sheet.xlsx\nWorksheets: 1\n\n",
            "Worksheet: Sheet1\nDimensions: A1:A1\nRows: 1\nColumns: 1\n\n",
        ).into())
    }
}

struct Harness {
    ctx: DbContext,
    store: BlobStore,
    intake: UploadIntake,
    runner: SweepRunner<DbPendingQueue>,
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let ctx = DbContext::from_path(&dir.path().join("marginalia.db"));
    ctx.init_schema().await.unwrap();

    let store = BlobStore::new(dir.path().join("documents"));
    let extractor: Arc<dyn Extractor> = Arc::new(ContentExtractor);

    let intake = UploadIntake::new(
        ctx.documents(),
        store.clone(),
        extractor.clone(),
        UploadLimits::default(),
    );
    let manager = LifecycleManager::new(
        DbPendingQueue::new(ctx.documents()),
        extractor,
        store.clone(),
    );

    Harness {
        ctx,
        store,
        intake,
        runner: SweepRunner::new(manager),
        _dir: dir,
    }
}

async fn upload(h: &Harness, name: &str, body: &[u8]) -> i32 {
    h.intake
        .intake(body, name, body.len() as u64, "alice")
        .await
        .unwrap()
        .id
}

async fn status_of(h: &Harness, id: i32) -> DocumentStatus {
    h.ctx.documents().get(id).await.unwrap().unwrap().status
}

#[tokio::test]
async fn test_sweep_drives_uploads_to_terminal_status() {
    let h = harness().await;

    let good = upload(&h, "report.pdf", b"quarterly numbers").await;
    let bad = upload(&h, "broken.pdf", b"BAD bytes").await;
    let sheet = upload(&h, "budget.xlsx", b"cells").await;

    for id in [good, bad, sheet] {
        assert_eq!(status_of(&h, id).await, DocumentStatus::Pending);
    }

    let report = h.runner.run_cycle(&CancellationToken::new()).await.unwrap();
    assert_eq!(report.discovered, 3);
    assert_eq!(report.completed, 2);
    assert_eq!(report.failed, 1);

    assert_eq!(status_of(&h, good).await, DocumentStatus::Completed);
    assert_eq!(status_of(&h, bad).await, DocumentStatus::Failed);
    assert_eq!(status_of(&h, sheet).await, DocumentStatus::Completed);

    let again = h.runner.run_cycle(&CancellationToken::new()).await.unwrap();
    assert_eq!(again.discovered, 0);
}

#[tokio::test]
async fn test_intake_records_page_count_and_path() {
    let h = harness().await;

    let doc = h
        .intake
        .intake(b"hello", "../../etc/notes.pdf", 5, "bob")
        .await
        .unwrap();

    assert_eq!(doc.kind, FileKind::Pdf);
    assert_eq!(doc.pdf_name, "notes.pdf");
    assert_eq!(doc.page_count, Some(3));
    assert!(doc.pdf_path.starts_with("uploads/pdfs/"));
    assert!(doc.pdf_path.ends_with("_notes.pdf"));
    assert_eq!(doc.spreadsheet_path, "");

    let stored = h.store.read(&doc.pdf_path).await.unwrap();
    assert_eq!(stored, b"hello");
}

#[tokio::test]
async fn test_unreadable_pdf_is_accepted_without_page_count() {
    let h = harness().await;

    let doc = h
        .intake
        .intake(b"BAD header", "scan.pdf", 10, "bob")
        .await
        .unwrap();
    assert_eq!(doc.page_count, None);
    assert_eq!(doc.status, DocumentStatus::Pending);
}

#[tokio::test]
async fn test_rejected_upload_creates_nothing() {
    let h = harness().await;

    let err = h
        .intake
        .intake(b"MZ", "setup.exe", 2, "mallory")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IntakeError::Validation(ValidationError::ExtensionNotAllowed(_))
    ));

    let docs = h.ctx.documents().list(&DocumentFilter::default()).await.unwrap();
    assert!(docs.is_empty());
    assert!(!h.store.root().join("uploads").exists());
}

#[tokio::test]
async fn test_comments_follow_their_document() {
    let h = harness().await;
    let id = upload(&h, "contract.pdf", b"terms").await;
    let comments = h.ctx.comments();

    let mut last = None;
    for body in ["first", "second"] {
        let c = Comment::new(id, 1, 10.0, 20.0, body.into(), "alice".into());
        last = Some(comments.create(&c).await.unwrap());
    }

    let listed = comments.list_for_document(id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(Some(&listed[0]), last.as_ref());
    assert_eq!(listed[0].body, "second");
    assert_eq!(listed[1].body, "first");

    let orphan = Comment::new(id + 100, 1, 0.0, 0.0, "lost".into(), "alice".into());
    assert!(matches!(
        comments.create(&orphan).await,
        Err(CommentError::DocumentNotFound(_))
    ));

    assert!(h.ctx.documents().delete(id).await.unwrap());
    assert!(comments.list_for_document(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_attach_spreadsheet_keeps_pdf_fields() {
    let h = harness().await;
    let id = upload(&h, "filing.pdf", b"body").await;

    let doc = h
        .intake
        .attach_spreadsheet(id, b"rows", "figures.xls", 4)
        .await
        .unwrap();

    assert_eq!(doc.pdf_name, "filing.pdf");
    assert_eq!(doc.spreadsheet_name, "figures.xls");
    assert!(doc.spreadsheet_path.starts_with("uploads/spreadsheets/"));
    assert_eq!(doc.kind, FileKind::Pdf);
}
