//! Sweep runner: periodically drives pending documents through the lifecycle.
//!
//! One cycle snapshots the pending documents and advances them one at a
//! time. A failing document is logged and counted, never fatal to the cycle.
//! Cancellation is checked between documents and during the sleep between
//! cycles; a document already being processed is allowed to finish.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::models::Document;
use crate::services::lifecycle::{AdvanceOutcome, LifecycleManager};

use super::{SweepEvent, SweepReport, WorkQueue, WorkQueueError};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Failed to discover pending documents: {0}")]
    Discovery(#[source] WorkQueueError),
}

/// Drives the lifecycle manager over every pending document.
pub struct SweepRunner<Q: WorkQueue<Item = Document>> {
    manager: LifecycleManager<Q>,
    events: Option<mpsc::Sender<SweepEvent>>,
}

impl<Q: WorkQueue<Item = Document>> SweepRunner<Q> {
    pub fn new(manager: LifecycleManager<Q>) -> Self {
        Self {
            manager,
            events: None,
        }
    }

    /// Publish progress events on a channel.
    pub fn with_events(mut self, events: mpsc::Sender<SweepEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: SweepEvent) {
        if let Some(tx) = &self.events {
            // Never block the sweep on a slow or absent listener.
            let _ = tx.try_send(event);
        }
    }

    /// Run a single sweep cycle.
    pub async fn run_cycle(&self, token: &CancellationToken) -> Result<SweepReport, SweepError> {
        let pending = match self.manager.queue().fetch_batch().await {
            Ok(docs) => docs,
            Err(e) => {
                self.emit(SweepEvent::DiscoveryFailed {
                    error: e.to_string(),
                });
                return Err(SweepError::Discovery(e));
            }
        };

        let mut report = SweepReport {
            discovered: pending.len(),
            ..Default::default()
        };
        info!("Found {} pending documents to process", pending.len());
        self.emit(SweepEvent::CycleStarted {
            discovered: pending.len(),
        });

        for (i, doc) in pending.iter().enumerate() {
            if token.is_cancelled() {
                report.cancelled = pending.len() - i;
                info!(
                    "Sweep cancelled, {} documents left pending",
                    report.cancelled
                );
                break;
            }

            info!(
                "Processing document: {} (ID: {})",
                doc.primary_name(),
                doc.id
            );
            self.emit(SweepEvent::DocumentStarted {
                document_id: doc.id,
                name: doc.primary_name().to_string(),
            });

            match self.manager.advance(doc).await {
                Ok(AdvanceOutcome::Completed) => {
                    report.completed += 1;
                    info!(
                        "Successfully processed document: {} (ID: {})",
                        doc.primary_name(),
                        doc.id
                    );
                    self.emit(SweepEvent::DocumentCompleted {
                        document_id: doc.id,
                    });
                }
                Ok(AdvanceOutcome::Skipped) => {
                    report.skipped += 1;
                    self.emit(SweepEvent::DocumentSkipped {
                        document_id: doc.id,
                    });
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        "Error processing document: {} (ID: {}): {}",
                        doc.primary_name(),
                        doc.id,
                        e
                    );
                    self.emit(SweepEvent::DocumentFailed {
                        document_id: doc.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        self.emit(SweepEvent::CycleCompleted { report });
        Ok(report)
    }

    /// Sweep on a fixed interval until the token is cancelled.
    ///
    /// The first cycle runs immediately.
    pub async fn run(&self, interval: Duration, token: CancellationToken) {
        info!(
            "Background sweep starting (interval: {}s)",
            interval.as_secs()
        );

        loop {
            if token.is_cancelled() {
                break;
            }

            match self.run_cycle(&token).await {
                Ok(report) => info!(
                    "Sweep cycle finished: {} completed, {} failed, {} skipped",
                    report.completed, report.failed, report.skipped
                ),
                Err(e) => error!("{}", e),
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!("Background sweep stopping");
    }
}
