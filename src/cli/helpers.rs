//! Shared helper functions for CLI commands.

use std::path::Path;

use anyhow::Context;

use crate::config::Settings;
use crate::models::Document;
use crate::repository::DbContext;

/// Truncate a string to a maximum number of characters, appending "..." if cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Format a size in MB for display.
pub fn format_mb(mb: f64) -> String {
    if mb < 1.0 {
        format!("{:.0} KB", mb * 1024.0)
    } else {
        format!("{:.1} MB", mb)
    }
}

/// Default uploader identity: `$USER`, else "anonymous".
pub fn default_user() -> String {
    std::env::var("USER")
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Read a local file for upload, returning its bytes and file name.
pub async fn read_upload(path: &Path) -> anyhow::Result<(Vec<u8>, String)> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    Ok((bytes, name))
}

/// Open the database, creating directories and applying migrations.
pub async fn open_context(settings: &Settings) -> anyhow::Result<DbContext> {
    settings.ensure_directories()?;
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    Ok(ctx)
}

/// Fetch a document or fail with a readable error.
pub async fn require_document(ctx: &DbContext, id: i32) -> anyhow::Result<Document> {
    ctx.documents()
        .get(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Document {} not found", id))
}
