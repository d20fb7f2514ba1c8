//! Data models for marginalia.

mod comment;
mod document;

pub use comment::Comment;
pub use document::{bytes_to_mb, Document, DocumentStatus, FileKind};
