//! Service layer for document intake and processing.
//!
//! Domain logic separated from the CLI, so any front end can drive it.

pub mod intake;
pub mod lifecycle;

pub use intake::{validate, IntakeError, UploadIntake, UploadLimits, ValidatedUpload, ValidationError};
pub use lifecycle::{AdvanceOutcome, LifecycleError, LifecycleManager};
