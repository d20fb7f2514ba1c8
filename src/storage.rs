//! Storage helpers for uploaded file content on disk.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::FileKind;

/// Top-level directory for uploaded content under the documents root.
pub const UPLOADS_DIR: &str = "uploads";

/// Strip any directory components from a client-supplied file name.
///
/// Both separators are handled regardless of platform.
pub fn sanitize_basename(file_name: &str) -> &str {
    file_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or("")
        .trim()
}

/// Construct the relative storage path for an upload.
///
/// `uploads/{pdfs|spreadsheets}/{uuid}_{basename}`, always with `/` separators
/// so the stored value is portable.
pub fn upload_relative_path(kind: FileKind, basename: &str) -> String {
    format!(
        "{}/{}/{}_{}",
        UPLOADS_DIR,
        kind.upload_subdir(),
        uuid::Uuid::new_v4(),
        basename
    )
}

/// Filesystem store for document blobs, rooted at the documents directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a stored blob.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Write bytes under a fresh collision-resistant name.
    ///
    /// Returns the relative path to persist with the record.
    pub async fn store(&self, kind: FileKind, basename: &str, bytes: &[u8]) -> io::Result<String> {
        let relative = upload_relative_path(kind, basename);
        let path = self.resolve(&relative);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(relative)
    }

    /// Remove a stored blob. Missing files are not an error.
    pub async fn remove(&self, relative: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.resolve(relative)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    pub async fn read(&self, relative: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.resolve(relative)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sanitize_basename() {
        assert_eq!(sanitize_basename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_basename("../../etc/passwd.pdf"), "passwd.pdf");
        assert_eq!(sanitize_basename("C:\\Users\\me\\data.xlsx"), "data.xlsx");
        assert_eq!(sanitize_basename("dir/"), "");
    }

    #[test]
    fn test_relative_path_layout() {
        let path = upload_relative_path(FileKind::Pdf, "a.pdf");
        assert!(path.starts_with("uploads/pdfs/"));
        assert!(path.ends_with("_a.pdf"));

        let path = upload_relative_path(FileKind::Spreadsheet, "b.xlsx");
        assert!(path.starts_with("uploads/spreadsheets/"));
    }

    #[test]
    fn test_same_name_gets_distinct_paths() {
        assert_ne!(
            upload_relative_path(FileKind::Pdf, "a.pdf"),
            upload_relative_path(FileKind::Pdf, "a.pdf")
        );
    }

    #[tokio::test]
    async fn test_store_read_remove() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path());

        let rel = store.store(FileKind::Pdf, "a.pdf", b"%PDF-1.4").await.unwrap();
        assert!(store.resolve(&rel).exists());
        assert_eq!(store.read(&rel).await.unwrap(), b"%PDF-1.4");

        store.remove(&rel).await.unwrap();
        assert!(!store.resolve(&rel).exists());
        // Second removal is a no-op.
        store.remove(&rel).await.unwrap();
    }
}
