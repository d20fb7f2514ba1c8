//! Upload intake: validate, store, record.
//!
//! A rejected upload leaves nothing behind. If the record cannot be written
//! the stored file is removed before the error is returned.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::extraction::Extractor;
use crate::models::{bytes_to_mb, Document, FileKind};
use crate::repository::{DieselDocumentRepository, DieselError};
use crate::storage::{sanitize_basename, BlobStore};

/// Why an upload was rejected. Shown to the user as-is.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("file name is empty")]
    EmptyFileName,
    #[error("file is empty")]
    EmptyFile,
    #[error("declared size {declared} bytes does not match received {actual} bytes")]
    SizeMismatch { declared: u64, actual: u64 },
    #[error("file is {size} bytes, larger than the {max_mb} MB limit")]
    TooLarge { size: u64, max_mb: u64 },
    #[error("file type '{0}' is not allowed")]
    ExtensionNotAllowed(String),
    #[error("file type '{0}' is not a supported document kind")]
    UnknownKind(String),
    #[error("file type '{0}' is not a spreadsheet")]
    NotASpreadsheet(String),
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to store file: {0}")]
    Storage(#[source] std::io::Error),
    #[error("failed to record document: {0}")]
    Database(#[from] DieselError),
    #[error("document {0} not found")]
    DocumentNotFound(i32),
}

/// Size and type limits for uploads.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_size_mb: u64,
    /// Lowercase, with leading dot.
    pub allowed_extensions: Vec<String>,
}

impl UploadLimits {
    pub fn new(max_size_mb: u64, allowed_extensions: &[String]) -> Self {
        Self {
            max_size_mb,
            allowed_extensions: allowed_extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
        }
    }

    fn max_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self::new(100, &[".pdf".into(), ".xls".into(), ".xlsx".into()])
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

/// An upload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUpload {
    pub basename: String,
    pub extension: String,
    pub kind: FileKind,
}

/// Check an upload against the limits without touching storage.
pub fn validate(
    file_name: &str,
    size: u64,
    declared_size: u64,
    limits: &UploadLimits,
) -> Result<ValidatedUpload, ValidationError> {
    let basename = sanitize_basename(file_name);
    if basename.is_empty() {
        return Err(ValidationError::EmptyFileName);
    }
    if size == 0 {
        return Err(ValidationError::EmptyFile);
    }
    if declared_size != size {
        return Err(ValidationError::SizeMismatch {
            declared: declared_size,
            actual: size,
        });
    }
    if size > limits.max_bytes() {
        return Err(ValidationError::TooLarge {
            size,
            max_mb: limits.max_size_mb,
        });
    }

    let extension = Path::new(basename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    if !limits.allowed_extensions.contains(&extension) {
        return Err(ValidationError::ExtensionNotAllowed(extension));
    }
    let kind =
        FileKind::from_extension(&extension).ok_or(ValidationError::UnknownKind(extension.clone()))?;

    Ok(ValidatedUpload {
        basename: basename.to_string(),
        extension,
        kind,
    })
}

/// Accepts uploaded files and creates their pending document records.
pub struct UploadIntake {
    repo: DieselDocumentRepository,
    store: BlobStore,
    extractor: Arc<dyn Extractor>,
    limits: UploadLimits,
}

impl UploadIntake {
    pub fn new(
        repo: DieselDocumentRepository,
        store: BlobStore,
        extractor: Arc<dyn Extractor>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            repo,
            store,
            extractor,
            limits,
        }
    }

    /// Validate and store an upload, creating a pending document.
    pub async fn intake(
        &self,
        bytes: &[u8],
        file_name: &str,
        declared_size: u64,
        uploader: &str,
    ) -> Result<Document, IntakeError> {
        let upload = validate(file_name, bytes.len() as u64, declared_size, &self.limits)?;

        let path = self
            .store
            .store(upload.kind, &upload.basename, bytes)
            .await
            .map_err(IntakeError::Storage)?;
        let size_mb = bytes_to_mb(bytes.len() as u64);

        let mut doc = match upload.kind {
            FileKind::Pdf => {
                let page_count = match self.extractor.page_count(&self.store.resolve(&path)).await
                {
                    Ok(n) => Some(n),
                    Err(e) => {
                        warn!("Could not read page count of {}: {}", upload.basename, e);
                        None
                    }
                };
                Document::new_pdf(
                    upload.basename.clone(),
                    path.clone(),
                    size_mb,
                    page_count,
                    uploader.to_string(),
                )
            }
            FileKind::Spreadsheet => Document::new_spreadsheet(
                upload.basename.clone(),
                path.clone(),
                size_mb,
                uploader.to_string(),
            ),
        };

        match self.repo.create(&doc).await {
            Ok(id) => {
                doc.id = id;
                info!(
                    "Accepted {} upload {} as document {}",
                    upload.kind.as_str(),
                    upload.basename,
                    id
                );
                Ok(doc)
            }
            Err(e) => {
                self.discard(&path).await;
                Err(e.into())
            }
        }
    }

    /// Attach a spreadsheet to an existing document.
    pub async fn attach_spreadsheet(
        &self,
        document_id: i32,
        bytes: &[u8],
        file_name: &str,
        declared_size: u64,
    ) -> Result<Document, IntakeError> {
        let upload = validate(file_name, bytes.len() as u64, declared_size, &self.limits)?;
        if upload.kind != FileKind::Spreadsheet {
            return Err(ValidationError::NotASpreadsheet(upload.extension).into());
        }
        if self.repo.get(document_id).await?.is_none() {
            return Err(IntakeError::DocumentNotFound(document_id));
        }

        let path = self
            .store
            .store(FileKind::Spreadsheet, &upload.basename, bytes)
            .await
            .map_err(IntakeError::Storage)?;
        let size_mb = bytes_to_mb(bytes.len() as u64);

        let updated = match self
            .repo
            .attach_spreadsheet(document_id, &upload.basename, &path, size_mb)
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                self.discard(&path).await;
                return Err(e.into());
            }
        };

        match self.repo.get(document_id).await? {
            Some(doc) if updated => {
                info!("Attached {} to document {}", upload.basename, document_id);
                Ok(doc)
            }
            _ => {
                self.discard(&path).await;
                Err(IntakeError::DocumentNotFound(document_id))
            }
        }
    }

    async fn discard(&self, path: &str) {
        if let Err(e) = self.store.remove(path).await {
            warn!("Failed to remove orphaned upload {}: {}", path, e);
        }
    }
}
