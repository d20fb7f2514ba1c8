//! Persistence layer for documents and comments.
//!
//! Backed by SQLite through Diesel, with the schema managed by cetane
//! migrations.

mod comment;
mod context;
mod document;
mod migrations;
mod models;
mod pool;
mod util;

pub use comment::{CommentError, DieselCommentRepository};
pub use context::DbContext;
pub use document::{DieselDocumentRepository, DocumentFilter};
pub use migrations::run_migrations;
pub use pool::{DbPool, DieselError, SqliteConn};
pub use util::{format_timestamp, parse_datetime, to_diesel_error};
