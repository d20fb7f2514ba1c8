//! Positioned annotations on document pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A text annotation attached to one page of a document.
///
/// Positions are opaque to the core; the coordinate system belongs to
/// whatever renders the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i32,
    pub document_id: i32,
    /// 1-based page number.
    pub page_number: i32,
    pub x_position: f64,
    pub y_position: f64,
    pub body: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create an unsaved comment.
    ///
    /// The id and creation time are assigned when the comment is stored.
    pub fn new(
        document_id: i32,
        page_number: i32,
        x_position: f64,
        y_position: f64,
        body: String,
        created_by: String,
    ) -> Self {
        Self {
            id: 0, // Set by database
            document_id,
            page_number,
            x_position,
            y_position,
            body,
            created_by,
            created_at: DateTime::UNIX_EPOCH, // Set by database
        }
    }
}
