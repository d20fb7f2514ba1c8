//! Document models for uploaded files and their processing state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing status of a document.
///
/// `Completed` and `Failed` are terminal; nothing moves a document out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of the primary file a document was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Spreadsheet,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Spreadsheet => "spreadsheet",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pdf" => Some(Self::Pdf),
            "spreadsheet" => Some(Self::Spreadsheet),
            _ => None,
        }
    }

    /// Map a lowercase extension (with leading dot) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".pdf" => Some(Self::Pdf),
            ".xls" | ".xlsx" => Some(Self::Spreadsheet),
            _ => None,
        }
    }

    /// Storage subdirectory under `uploads/`.
    pub fn upload_subdir(&self) -> &'static str {
        match self {
            Self::Pdf => "pdfs",
            Self::Spreadsheet => "spreadsheets",
        }
    }
}

/// Convert a byte count to megabytes.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// An uploaded document.
///
/// Exactly one of the pdf or spreadsheet field groups is populated at
/// creation. The unused group holds empty strings and zero, never `None`.
/// A spreadsheet may later be attached to a PDF document, which is the only
/// way both groups end up populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Database row ID (0 until persisted).
    pub id: i32,
    pub kind: FileKind,
    pub pdf_name: String,
    /// Path relative to the documents root.
    pub pdf_path: String,
    /// Page count read at intake; `None` when the PDF could not be parsed.
    pub page_count: Option<u32>,
    /// Size of the primary file in MB.
    pub file_size_mb: f64,
    pub uploaded_by: String,
    pub status: DocumentStatus,
    pub spreadsheet_name: String,
    /// Path relative to the documents root.
    pub spreadsheet_path: String,
    pub spreadsheet_size_mb: f64,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    /// Create a new pending PDF document.
    pub fn new_pdf(
        name: String,
        path: String,
        size_mb: f64,
        page_count: Option<u32>,
        uploaded_by: String,
    ) -> Self {
        Self {
            id: 0, // Set by database
            kind: FileKind::Pdf,
            pdf_name: name,
            pdf_path: path,
            page_count,
            file_size_mb: size_mb,
            uploaded_by,
            status: DocumentStatus::Pending,
            spreadsheet_name: String::new(),
            spreadsheet_path: String::new(),
            spreadsheet_size_mb: 0.0,
            uploaded_at: Utc::now(),
        }
    }

    /// Create a new pending spreadsheet document.
    pub fn new_spreadsheet(name: String, path: String, size_mb: f64, uploaded_by: String) -> Self {
        Self {
            id: 0, // Set by database
            kind: FileKind::Spreadsheet,
            pdf_name: String::new(),
            pdf_path: String::new(),
            page_count: None,
            file_size_mb: size_mb,
            uploaded_by,
            status: DocumentStatus::Pending,
            spreadsheet_name: name,
            spreadsheet_path: path,
            spreadsheet_size_mb: size_mb,
            uploaded_at: Utc::now(),
        }
    }

    /// Name of the primary file.
    pub fn primary_name(&self) -> &str {
        match self.kind {
            FileKind::Pdf => &self.pdf_name,
            FileKind::Spreadsheet => &self.spreadsheet_name,
        }
    }

    /// Relative path of the primary file.
    pub fn primary_path(&self) -> &str {
        match self.kind {
            FileKind::Pdf => &self.pdf_path,
            FileKind::Spreadsheet => &self.spreadsheet_path,
        }
    }

    pub fn has_pdf(&self) -> bool {
        !self.pdf_path.is_empty()
    }

    pub fn has_spreadsheet(&self) -> bool {
        !self.spreadsheet_path.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip_strings() {
        for status in DocumentStatus::ALL {
            assert_eq!(DocumentStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(DocumentStatus::from_str("Pending"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!DocumentStatus::Pending.is_terminal());
        assert!(!DocumentStatus::Processing.is_terminal());
        assert!(DocumentStatus::Completed.is_terminal());
        assert!(DocumentStatus::Failed.is_terminal());
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(FileKind::from_extension(".pdf"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_extension(".xls"), Some(FileKind::Spreadsheet));
        assert_eq!(FileKind::from_extension(".xlsx"), Some(FileKind::Spreadsheet));
        assert_eq!(FileKind::from_extension(".exe"), None);
    }

    #[test]
    fn test_new_pdf_leaves_spreadsheet_fields_empty() {
        let doc = Document::new_pdf(
            "report.pdf".into(),
            "uploads/pdfs/x_report.pdf".into(),
            2.0,
            Some(3),
            "alice".into(),
        );
        assert_eq!(doc.status, DocumentStatus::Pending);
        assert!(doc.has_pdf());
        assert!(!doc.has_spreadsheet());
        assert_eq!(doc.spreadsheet_size_mb, 0.0);
        assert_eq!(doc.primary_path(), "uploads/pdfs/x_report.pdf");
    }

    #[test]
    fn test_new_spreadsheet_leaves_pdf_fields_empty() {
        let doc = Document::new_spreadsheet(
            "data.xlsx".into(),
            "uploads/spreadsheets/x_data.xlsx".into(),
            0.5,
            "bob".into(),
        );
        assert!(!doc.has_pdf());
        assert!(doc.has_spreadsheet());
        assert_eq!(doc.page_count, None);
        assert_eq!(doc.primary_name(), "data.xlsx");
    }

    #[test]
    fn test_bytes_to_mb() {
        assert_eq!(bytes_to_mb(2 * 1024 * 1024), 2.0);
        assert_eq!(bytes_to_mb(0), 0.0);
    }
}
