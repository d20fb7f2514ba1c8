//! Diesel-based document repository for SQLite.
//!
//! Status changes go through conditional updates so that two workers racing
//! for the same document cannot both move it out of `pending`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use diesel_async::RunQueryDsl;

use super::models::{DocumentRecord, LastInsertRowId, NewDocument};
use super::pool::{DbPool, DieselError};
use super::util::{format_timestamp, parse_datetime};
use crate::models::{Document, DocumentStatus, FileKind};
use crate::schema::documents;

impl TryFrom<DocumentRecord> for Document {
    type Error = DieselError;

    fn try_from(record: DocumentRecord) -> Result<Self, Self::Error> {
        let kind = FileKind::from_str(&record.file_kind).ok_or_else(|| {
            DieselError::DeserializationError(
                format!("unknown file kind '{}'", record.file_kind).into(),
            )
        })?;
        let status = DocumentStatus::from_str(&record.status).ok_or_else(|| {
            DieselError::DeserializationError(
                format!("unknown document status '{}'", record.status).into(),
            )
        })?;

        Ok(Document {
            id: record.id,
            kind,
            pdf_name: record.pdf_name,
            pdf_path: record.pdf_path,
            page_count: record.page_count.and_then(|n| u32::try_from(n).ok()),
            file_size_mb: record.file_size_mb,
            uploaded_by: record.uploaded_by,
            status,
            spreadsheet_name: record.spreadsheet_name,
            spreadsheet_path: record.spreadsheet_path,
            spreadsheet_size_mb: record.spreadsheet_size_mb,
            uploaded_at: parse_datetime(&record.uploaded_at),
        })
    }
}

fn into_documents(records: Vec<DocumentRecord>) -> Result<Vec<Document>, DieselError> {
    records.into_iter().map(Document::try_from).collect()
}

/// Criteria for listing documents. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub uploaded_by: Option<String>,
    pub status: Option<DocumentStatus>,
    /// Only documents uploaded at or after this instant.
    pub since: Option<DateTime<Utc>>,
}

impl DocumentFilter {
    pub fn with_uploader(mut self, uploader: impl Into<String>) -> Self {
        self.uploaded_by = Some(uploader.into());
        self
    }

    pub fn with_status(mut self, status: DocumentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }
}

/// Diesel-based document repository.
#[derive(Clone)]
pub struct DieselDocumentRepository {
    pool: DbPool,
}

impl DieselDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a document and return its assigned ID.
    pub async fn create(&self, doc: &Document) -> Result<i32, DieselError> {
        let mut conn = self.pool.get().await?;

        let uploaded_at = format_timestamp(&doc.uploaded_at);
        let page_count = doc.page_count.and_then(|n| i32::try_from(n).ok());

        diesel::insert_into(documents::table)
            .values(NewDocument {
                file_kind: doc.kind.as_str(),
                pdf_name: &doc.pdf_name,
                pdf_path: &doc.pdf_path,
                page_count,
                file_size_mb: doc.file_size_mb,
                uploaded_by: &doc.uploaded_by,
                status: doc.status.as_str(),
                spreadsheet_name: &doc.spreadsheet_name,
                spreadsheet_path: &doc.spreadsheet_path,
                spreadsheet_size_mb: doc.spreadsheet_size_mb,
                uploaded_at: &uploaded_at,
            })
            .execute(&mut conn)
            .await?;

        let row: LastInsertRowId = diesel::sql_query("SELECT last_insert_rowid()")
            .get_result(&mut conn)
            .await?;

        i32::try_from(row.id)
            .map_err(|_| DieselError::DeserializationError("row id out of range".into()))
    }

    /// Get a document by ID.
    pub async fn get(&self, id: i32) -> Result<Option<Document>, DieselError> {
        let mut conn = self.pool.get().await?;

        documents::table
            .find(id)
            .first::<DocumentRecord>(&mut conn)
            .await
            .optional()?
            .map(Document::try_from)
            .transpose()
    }

    /// List documents matching a filter, newest first.
    pub async fn list(&self, filter: &DocumentFilter) -> Result<Vec<Document>, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query: documents::BoxedQuery<'_, Sqlite> = documents::table.into_boxed();
        if let Some(ref uploader) = filter.uploaded_by {
            query = query.filter(documents::uploaded_by.eq(uploader.clone()));
        }
        if let Some(status) = filter.status {
            query = query.filter(documents::status.eq(status.as_str()));
        }
        if let Some(since) = filter.since {
            query = query.filter(documents::uploaded_at.ge(format_timestamp(&since)));
        }

        let records = query
            .order(documents::id.desc())
            .load::<DocumentRecord>(&mut conn)
            .await?;

        into_documents(records)
    }

    /// Snapshot of all pending documents, most recently created first.
    pub async fn list_pending(&self) -> Result<Vec<Document>, DieselError> {
        self.list(&DocumentFilter::default().with_status(DocumentStatus::Pending))
            .await
    }

    /// Number of pending documents.
    pub async fn count_pending(&self) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;

        let count: i64 = documents::table
            .filter(documents::status.eq(DocumentStatus::Pending.as_str()))
            .count()
            .get_result(&mut conn)
            .await?;

        Ok(count as u64)
    }

    /// Document counts for every status, zero included.
    pub async fn count_by_status(&self) -> Result<Vec<(DocumentStatus, u64)>, DieselError> {
        use diesel::dsl::count_star;

        let mut conn = self.pool.get().await?;

        let rows: Vec<(String, i64)> = documents::table
            .group_by(documents::status)
            .select((documents::status, count_star()))
            .load(&mut conn)
            .await?;

        let counts: HashMap<String, i64> = rows.into_iter().collect();

        Ok(DocumentStatus::ALL
            .iter()
            .map(|s| (*s, counts.get(s.as_str()).copied().unwrap_or(0) as u64))
            .collect())
    }

    /// Unconditionally set a document's status.
    ///
    /// Returns false if the document does not exist.
    pub async fn update_status(&self, id: i32, status: DocumentStatus) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(documents::table.find(id))
            .set(documents::status.eq(status.as_str()))
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }

    /// Move a document from one status to another.
    ///
    /// Returns false when the document is missing or no longer in `from`.
    pub async fn transition(
        &self,
        id: i32,
        from: DocumentStatus,
        to: DocumentStatus,
    ) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(
            documents::table
                .filter(documents::id.eq(id))
                .filter(documents::status.eq(from.as_str())),
        )
        .set(documents::status.eq(to.as_str()))
        .execute(&mut conn)
        .await?;

        Ok(rows > 0)
    }

    /// Fill the spreadsheet fields of an existing document.
    pub async fn attach_spreadsheet(
        &self,
        id: i32,
        name: &str,
        path: &str,
        size_mb: f64,
    ) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(documents::table.find(id))
            .set((
                documents::spreadsheet_name.eq(name),
                documents::spreadsheet_path.eq(path),
                documents::spreadsheet_size_mb.eq(size_mb),
            ))
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }

    /// Delete a document. Its comments go with it.
    pub async fn delete(&self, id: i32) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::delete(documents::table.find(id))
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }
}
