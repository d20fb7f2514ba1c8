//! Database-backed queue of pending documents.
//!
//! Claiming is a compare-and-swap on the status column, so two sweeps
//! racing for the same document cannot both process it.

use async_trait::async_trait;
use tracing::debug;

use crate::models::{Document, DocumentStatus};
use crate::repository::DieselDocumentRepository;

use super::{WorkHandle, WorkQueue, WorkQueueError};

/// Work queue over documents in `pending`.
#[derive(Clone)]
pub struct DbPendingQueue {
    repo: DieselDocumentRepository,
}

impl DbPendingQueue {
    pub fn new(repo: DieselDocumentRepository) -> Self {
        Self { repo }
    }

    async fn leave_processing(
        &self,
        doc: &Document,
        to: DocumentStatus,
    ) -> Result<(), WorkQueueError> {
        if self
            .repo
            .transition(doc.id, DocumentStatus::Processing, to)
            .await?
        {
            Ok(())
        } else {
            Err(WorkQueueError::InvalidState(format!(
                "document {} is no longer processing",
                doc.id
            )))
        }
    }
}

#[async_trait]
impl WorkQueue for DbPendingQueue {
    type Item = Document;

    async fn count(&self) -> Result<u64, WorkQueueError> {
        Ok(self.repo.count_pending().await?)
    }

    async fn fetch_batch(&self) -> Result<Vec<Document>, WorkQueueError> {
        Ok(self.repo.list_pending().await?)
    }

    async fn claim(&self, doc: &Document) -> Result<WorkHandle<Document>, WorkQueueError> {
        let claimed = self
            .repo
            .transition(doc.id, DocumentStatus::Pending, DocumentStatus::Processing)
            .await?;

        if claimed {
            let mut item = doc.clone();
            item.status = DocumentStatus::Processing;
            return Ok(WorkHandle::new(item));
        }

        match self.repo.get(doc.id).await? {
            Some(current) => {
                debug!("Document {} already {}", doc.id, current.status);
                Err(WorkQueueError::AlreadyClaimed)
            }
            None => Err(WorkQueueError::NotFound(doc.id.to_string())),
        }
    }

    async fn complete(&self, handle: WorkHandle<Document>) -> Result<(), WorkQueueError> {
        let doc = handle.consume();
        self.leave_processing(&doc, DocumentStatus::Completed).await
    }

    async fn fail(&self, handle: WorkHandle<Document>, error: &str) -> Result<(), WorkQueueError> {
        let doc = handle.consume();
        debug!("Marking document {} failed: {}", doc.id, error);
        self.leave_processing(&doc, DocumentStatus::Failed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup_test_db;

    fn pdf() -> Document {
        Document::new_pdf(
            "a.pdf".into(),
            "uploads/pdfs/x_a.pdf".into(),
            1.0,
            None,
            "alice".into(),
        )
    }

    #[tokio::test]
    async fn test_claim_complete() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.documents();
        let queue = DbPendingQueue::new(repo.clone());
        let id = repo.create(&pdf()).await.unwrap();

        let batch = queue.fetch_batch().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(queue.count().await.unwrap(), 1);

        let handle = queue.claim(&batch[0]).await.unwrap();
        assert_eq!(handle.item().status, DocumentStatus::Processing);
        assert_eq!(queue.count().await.unwrap(), 0);

        queue.complete(handle).await.unwrap();
        let doc = repo.get(id).await.unwrap().unwrap();
        assert_eq!(doc.status, DocumentStatus::Completed);
    }

    #[tokio::test]
    async fn test_second_claim_is_rejected() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.documents();
        let queue = DbPendingQueue::new(repo.clone());
        repo.create(&pdf()).await.unwrap();

        let doc = queue.fetch_batch().await.unwrap().remove(0);
        let handle = queue.claim(&doc).await.unwrap();

        let err = queue.claim(&doc).await.unwrap_err();
        assert!(matches!(err, WorkQueueError::AlreadyClaimed));

        queue.fail(handle, "boom").await.unwrap();
        let stored = repo.get(doc.id).await.unwrap().unwrap();
        assert_eq!(stored.status, DocumentStatus::Failed);
    }

    #[tokio::test]
    async fn test_claim_deleted_document() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.documents();
        let queue = DbPendingQueue::new(repo.clone());
        repo.create(&pdf()).await.unwrap();

        let doc = queue.fetch_batch().await.unwrap().remove(0);
        repo.delete(doc.id).await.unwrap();

        let err = queue.claim(&doc).await.unwrap_err();
        assert!(matches!(err, WorkQueueError::NotFound(_)));
    }
}
