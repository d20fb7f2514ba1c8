//! Database context bundling the repositories over one connection factory.

use std::path::Path;

use super::comment::DieselCommentRepository;
use super::document::DieselDocumentRepository;
use super::migrations::run_migrations;
use super::pool::{DbPool, DieselError};

/// Entry point to the persistence layer.
#[derive(Clone)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    /// Create a context from a database URL or path.
    pub fn new(database_url: &str) -> Self {
        Self {
            pool: DbPool::new(database_url),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        Self {
            pool: DbPool::from_path(path),
        }
    }

    /// Apply any pending schema migrations.
    pub async fn init_schema(&self) -> Result<Vec<String>, DieselError> {
        run_migrations(self.pool.database_url()).await
    }

    pub fn documents(&self) -> DieselDocumentRepository {
        DieselDocumentRepository::new(self.pool.clone())
    }

    pub fn comments(&self) -> DieselCommentRepository {
        DieselCommentRepository::new(self.pool.clone())
    }
}
