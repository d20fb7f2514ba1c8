//! Work queue abstraction for the claim/complete/fail lifecycle.
//!
//! The sweep discovers pending work, claims each item, processes it and
//! records the outcome. The queue owns discovery and the claim; result
//! handling belongs to the caller.

mod db_pending;
mod error;
mod events;
mod handle;
pub mod runner;

pub use db_pending::DbPendingQueue;
pub use error::WorkQueueError;
pub use events::{SweepEvent, SweepReport};
pub use handle::WorkHandle;
pub use runner::{SweepError, SweepRunner};

use async_trait::async_trait;

/// A queue that manages the claim/complete/fail lifecycle for work items.
///
/// Claims are exclusive: once an item is claimed no other worker can claim
/// it until it has been completed or failed.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// The work item type returned by this queue.
    type Item: Send + Sync;

    /// Count items available for processing.
    async fn count(&self) -> Result<u64, WorkQueueError>;

    /// Snapshot of items available for processing.
    async fn fetch_batch(&self) -> Result<Vec<Self::Item>, WorkQueueError>;

    /// Claim an item for processing.
    ///
    /// Returns `WorkQueueError::AlreadyClaimed` if another worker holds it.
    async fn claim(&self, item: &Self::Item) -> Result<WorkHandle<Self::Item>, WorkQueueError>;

    /// Mark a claimed item as successfully processed.
    async fn complete(&self, handle: WorkHandle<Self::Item>) -> Result<(), WorkQueueError>;

    /// Mark a claimed item as failed.
    async fn fail(&self, handle: WorkHandle<Self::Item>, error: &str)
        -> Result<(), WorkQueueError>;
}
