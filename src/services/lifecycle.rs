//! Document lifecycle: `pending → processing → completed | failed`.
//!
//! The manager claims a pending document, runs extraction on its primary
//! file and records the outcome. Only the status column changes.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};

use crate::extraction::{ExtractionError, Extractor};
use crate::models::{Document, DocumentStatus, FileKind};
use crate::storage::BlobStore;
use crate::work_queue::{WorkQueue, WorkQueueError};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("extraction failed for document {document_id}: {source}")]
    Extraction {
        document_id: i32,
        #[source]
        source: ExtractionError,
    },
    #[error(transparent)]
    Queue(#[from] WorkQueueError),
}

/// What `advance` did with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Completed,
    /// Not pending, or claimed by someone else first.
    Skipped,
}

/// Owns the status state machine. Stateless across calls.
pub struct LifecycleManager<Q> {
    queue: Q,
    extractor: Arc<dyn Extractor>,
    store: BlobStore,
}

impl<Q: WorkQueue<Item = Document>> LifecycleManager<Q> {
    pub fn new(queue: Q, extractor: Arc<dyn Extractor>, store: BlobStore) -> Self {
        Self {
            queue,
            extractor,
            store,
        }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Drive one pending document to a terminal state.
    ///
    /// On extraction failure the document is marked failed and the error is
    /// returned.
    pub async fn advance(&self, doc: &Document) -> Result<AdvanceOutcome, LifecycleError> {
        if doc.status != DocumentStatus::Pending {
            debug!("Document {} is {}, not advancing", doc.id, doc.status);
            return Ok(AdvanceOutcome::Skipped);
        }

        let handle = match self.queue.claim(doc).await {
            Ok(handle) => handle,
            Err(WorkQueueError::AlreadyClaimed) | Err(WorkQueueError::NotFound(_)) => {
                debug!("Document {} claimed elsewhere, skipping", doc.id);
                return Ok(AdvanceOutcome::Skipped);
            }
            Err(e) => return Err(e.into()),
        };

        let item = handle.item();
        let path = self.store.resolve(item.primary_path());
        let extracted = match item.kind {
            FileKind::Pdf => self.extractor.extract_text(&path).await,
            FileKind::Spreadsheet => self.extractor.workbook_summary(&path).await,
        };

        match extracted {
            Ok(text) => {
                debug!("Extracted {} chars from document {}", text.len(), doc.id);
                self.queue.complete(handle).await?;
                Ok(AdvanceOutcome::Completed)
            }
            Err(e) => {
                if let Err(qe) = self.queue.fail(handle, &e.to_string()).await {
                    error!("Could not mark document {} failed: {}", doc.id, qe);
                }
                Err(LifecycleError::Extraction {
                    document_id: doc.id,
                    source: e,
                })
            }
        }
    }
}
