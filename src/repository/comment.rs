//! Diesel-based comment repository for SQLite.

use chrono::{DateTime, Utc};
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel_async::{AsyncConnection, RunQueryDsl};
use thiserror::Error;

use super::models::{CommentRecord, LastInsertRowId, NewComment};
use super::pool::{DbPool, DieselError};
use super::util::{format_timestamp, parse_datetime};
use crate::models::Comment;
use crate::schema::comments;

/// Errors from creating a comment.
#[derive(Debug, Error)]
pub enum CommentError {
    #[error("comment body is empty")]
    EmptyBody,

    #[error("page number must be at least 1 (got {0})")]
    InvalidPage(i32),

    #[error("document {0} not found")]
    DocumentNotFound(i32),

    #[error("database error: {0}")]
    Database(#[from] DieselError),
}

impl From<CommentRecord> for Comment {
    fn from(record: CommentRecord) -> Self {
        Comment {
            id: record.id,
            document_id: record.document_id,
            page_number: record.page_number,
            x_position: record.x_position,
            y_position: record.y_position,
            body: record.body,
            created_by: record.created_by,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Timestamp for a new comment: now, unless the latest existing comment on
/// the document is stamped later.
fn next_timestamp(latest: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match latest {
        Some(latest) if latest > now => latest,
        _ => now,
    }
}

/// Diesel-based comment repository.
#[derive(Clone)]
pub struct DieselCommentRepository {
    pool: DbPool,
}

impl DieselCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a comment and return the stored row.
    ///
    /// The id and `created_at` are assigned here; whatever the caller put in
    /// those fields is ignored. Timestamps never go backwards within a
    /// document, even if the system clock does.
    pub async fn create(&self, comment: &Comment) -> Result<Comment, CommentError> {
        if comment.body.trim().is_empty() {
            return Err(CommentError::EmptyBody);
        }
        if comment.page_number < 1 {
            return Err(CommentError::InvalidPage(comment.page_number));
        }

        let mut conn = self.pool.get().await?;
        let document_id = comment.document_id;

        let inserted = conn
            .transaction(|conn| {
                Box::pin(async move {
                    let latest: Option<String> = comments::table
                        .filter(comments::document_id.eq(document_id))
                        .select(max(comments::created_at))
                        .get_result(conn)
                        .await?;
                    let created_at = format_timestamp(&next_timestamp(
                        latest.as_deref().map(parse_datetime),
                        Utc::now(),
                    ));

                    diesel::insert_into(comments::table)
                        .values(NewComment {
                            document_id,
                            page_number: comment.page_number,
                            x_position: comment.x_position,
                            y_position: comment.y_position,
                            body: &comment.body,
                            created_by: &comment.created_by,
                            created_at: &created_at,
                        })
                        .execute(conn)
                        .await?;

                    let row: LastInsertRowId = diesel::sql_query("SELECT last_insert_rowid()")
                        .get_result(conn)
                        .await?;

                    Ok::<_, DieselError>((row.id, created_at))
                })
            })
            .await;

        let (id, created_at) = match inserted {
            Ok(row) => row,
            Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
                return Err(CommentError::DocumentNotFound(document_id));
            }
            Err(e) => return Err(e.into()),
        };

        let id = i32::try_from(id).map_err(|_| {
            CommentError::Database(DieselError::DeserializationError(
                "row id out of range".into(),
            ))
        })?;

        Ok(Comment {
            id,
            created_at: parse_datetime(&created_at),
            ..comment.clone()
        })
    }

    /// Comments on a document, newest first.
    pub async fn list_for_document(&self, document_id: i32) -> Result<Vec<Comment>, DieselError> {
        let mut conn = self.pool.get().await?;

        comments::table
            .filter(comments::document_id.eq(document_id))
            .order((comments::created_at.desc(), comments::id.desc()))
            .load::<CommentRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(Comment::from).collect())
    }

    /// Number of comments on a document.
    pub async fn count_for_document(&self, document_id: i32) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;

        let count: i64 = comments::table
            .filter(comments::document_id.eq(document_id))
            .count()
            .get_result(&mut conn)
            .await?;

        Ok(count as u64)
    }
}
