//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// Document record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::documents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DocumentRecord {
    pub id: i32,
    pub file_kind: String,
    pub pdf_name: String,
    pub pdf_path: String,
    pub page_count: Option<i32>,
    pub file_size_mb: f64,
    pub uploaded_by: String,
    pub status: String,
    pub spreadsheet_name: String,
    pub spreadsheet_path: String,
    pub spreadsheet_size_mb: f64,
    pub uploaded_at: String,
}

/// New document for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::documents)]
pub struct NewDocument<'a> {
    pub file_kind: &'a str,
    pub pdf_name: &'a str,
    pub pdf_path: &'a str,
    pub page_count: Option<i32>,
    pub file_size_mb: f64,
    pub uploaded_by: &'a str,
    pub status: &'a str,
    pub spreadsheet_name: &'a str,
    pub spreadsheet_path: &'a str,
    pub spreadsheet_size_mb: f64,
    pub uploaded_at: &'a str,
}

/// Comment record from the database.
#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(table_name = schema::comments)]
#[diesel(belongs_to(DocumentRecord, foreign_key = document_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CommentRecord {
    pub id: i32,
    pub document_id: i32,
    pub page_number: i32,
    pub x_position: f64,
    pub y_position: f64,
    pub body: String,
    pub created_by: String,
    pub created_at: String,
}

/// New comment for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::comments)]
pub struct NewComment<'a> {
    pub document_id: i32,
    pub page_number: i32,
    pub x_position: f64,
    pub y_position: f64,
    pub body: &'a str,
    pub created_by: &'a str,
    pub created_at: &'a str,
}

/// Row type for `SELECT last_insert_rowid()`.
#[derive(QueryableByName)]
pub(crate) struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt, column_name = "last_insert_rowid()")]
    pub id: i64,
}
