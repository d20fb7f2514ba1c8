//! Sweep progress events and per-cycle totals.

use serde::Serialize;

/// Totals for one sweep cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Pending documents found at the start of the cycle.
    pub discovered: usize,
    pub completed: usize,
    pub failed: usize,
    /// Claimed by another worker before this cycle got to them.
    pub skipped: usize,
    /// Left untouched because the sweep was cancelled.
    pub cancelled: usize,
}

impl SweepReport {
    /// Documents this cycle attempted.
    pub fn processed(&self) -> usize {
        self.completed + self.failed + self.skipped
    }
}

/// Progress events published while sweeping.
///
/// Delivery is best-effort: a full channel drops events rather than
/// stalling the sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepEvent {
    CycleStarted {
        discovered: usize,
    },
    DocumentStarted {
        document_id: i32,
        name: String,
    },
    DocumentCompleted {
        document_id: i32,
    },
    DocumentSkipped {
        document_id: i32,
    },
    DocumentFailed {
        document_id: i32,
        error: String,
    },
    DiscoveryFailed {
        error: String,
    },
    CycleCompleted {
        report: SweepReport,
    },
}
