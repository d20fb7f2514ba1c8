//! Document management commands.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use console::style;

use crate::config::Settings;
use crate::extraction::{Extractor, LocalExtractor};
use crate::models::{DocumentStatus, FileKind};
use crate::repository::{DbContext, DocumentFilter};
use crate::services::UploadIntake;

use crate::cli::helpers::{
    default_user, format_mb, open_context, read_upload, require_document, truncate,
};

fn status_style(status: DocumentStatus) -> console::StyledObject<&'static str> {
    let s = style(status.as_str());
    match status {
        DocumentStatus::Pending => s.yellow(),
        DocumentStatus::Processing => s.cyan(),
        DocumentStatus::Completed => s.green(),
        DocumentStatus::Failed => s.red(),
    }
}

fn intake(settings: &Settings, ctx: &DbContext) -> UploadIntake {
    UploadIntake::new(
        ctx.documents(),
        settings.blob_store(),
        Arc::new(LocalExtractor::new()),
        settings.upload_limits(),
    )
}

/// Upload a local file as a new document.
pub async fn cmd_upload(settings: &Settings, file: &Path, user: Option<&str>) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let (bytes, name) = read_upload(file).await?;
    let uploader = user.map(String::from).unwrap_or_else(default_user);

    let doc = intake(settings, &ctx)
        .intake(&bytes, &name, bytes.len() as u64, &uploader)
        .await?;

    println!(
        "{} Uploaded {} as document {}",
        style("✓").green(),
        doc.primary_name(),
        style(doc.id).bold()
    );
    match doc.page_count {
        Some(pages) => println!("  {} pages, {}", pages, format_mb(doc.file_size_mb)),
        None => println!("  {}", format_mb(doc.file_size_mb)),
    }
    println!("  {} Queued for processing", style("→").cyan());

    Ok(())
}

/// Attach a spreadsheet to an existing document.
pub async fn cmd_attach(settings: &Settings, id: i32, file: &Path) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let (bytes, name) = read_upload(file).await?;

    let doc = intake(settings, &ctx)
        .attach_spreadsheet(id, &bytes, &name, bytes.len() as u64)
        .await?;

    println!(
        "{} Attached {} to document {}",
        style("✓").green(),
        doc.spreadsheet_name,
        doc.id
    );
    Ok(())
}

/// List documents.
pub async fn cmd_list(
    settings: &Settings,
    user: Option<String>,
    status: Option<DocumentStatus>,
    since: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let filter = DocumentFilter {
        uploaded_by: user,
        status,
        since,
    };
    let docs = ctx.documents().list(&filter).await?;

    if docs.is_empty() {
        println!("{} No documents found", style("!").yellow());
        return Ok(());
    }

    println!(
        "{:>5}  {:<11}  {:<12}  {:<36}  {:<12}  {}",
        style("ID").bold(),
        style("Kind").bold(),
        style("Status").bold(),
        style("Name").bold(),
        style("Uploader").bold(),
        style("Uploaded").bold()
    );
    for doc in &docs {
        println!(
            "{:>5}  {:<11}  {:<12}  {:<36}  {:<12}  {}",
            doc.id,
            doc.kind.as_str(),
            status_style(doc.status),
            truncate(doc.primary_name(), 36),
            truncate(&doc.uploaded_by, 12),
            doc.uploaded_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!("\n{} documents", docs.len());

    Ok(())
}

/// Show a document with its comments.
pub async fn cmd_show(settings: &Settings, id: i32) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let doc = require_document(&ctx, id).await?;
    let comments = ctx.comments().list_for_document(id).await?;

    println!("{} {}", style("Document").bold(), doc.id);
    println!("  Status:    {}", status_style(doc.status));
    println!("  Uploader:  {}", doc.uploaded_by);
    println!("  Uploaded:  {}", doc.uploaded_at.to_rfc3339());
    if doc.has_pdf() {
        let pages = doc
            .page_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  PDF:       {} ({}, {} pages)",
            doc.pdf_name,
            format_mb(doc.file_size_mb),
            pages
        );
    }
    if doc.has_spreadsheet() {
        println!(
            "  Sheet:     {} ({})",
            doc.spreadsheet_name,
            format_mb(doc.spreadsheet_size_mb)
        );
    }

    if comments.is_empty() {
        println!("\n  No comments");
    } else {
        println!("\n{} ({})", style("Comments").bold(), comments.len());
        for c in &comments {
            println!(
                "  [p{} @ {:.1},{:.1}] {} {}: {}",
                c.page_number,
                c.x_position,
                c.y_position,
                c.created_at.format("%Y-%m-%d %H:%M"),
                style(&c.created_by).cyan(),
                c.body
            );
        }
    }

    Ok(())
}

/// Print extracted PDF text.
pub async fn cmd_text(settings: &Settings, id: i32) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let doc = require_document(&ctx, id).await?;
    if !doc.has_pdf() {
        anyhow::bail!("Document {} has no PDF", id);
    }

    let path = settings.blob_store().resolve(&doc.pdf_path);
    let text = LocalExtractor::new().text_or_message(&path).await;
    print!("{}", text);
    Ok(())
}

/// Print the first worksheet of the document's spreadsheet.
pub async fn cmd_table(settings: &Settings, id: i32, limit: usize) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let doc = require_document(&ctx, id).await?;
    if !doc.has_spreadsheet() {
        anyhow::bail!("Document {} has no spreadsheet", id);
    }

    let path = settings.blob_store().resolve(&doc.spreadsheet_path);
    let table = LocalExtractor::new().read_tabular(&path).await?;

    println!("{}", style(table.columns.join(" | ")).bold());
    for row in table.rows.iter().take(limit) {
        println!("{}", row.join(" | "));
    }
    if table.rows.len() > limit {
        println!(
            "{} {} more rows",
            style("…").dim(),
            table.rows.len() - limit
        );
    }
    Ok(())
}

/// Summarize the worksheets of the document's spreadsheet.
pub async fn cmd_info(settings: &Settings, id: i32) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let doc = require_document(&ctx, id).await?;
    if !doc.has_spreadsheet() {
        anyhow::bail!("Document {} has no spreadsheet", id);
    }

    let path = settings.blob_store().resolve(&doc.spreadsheet_path);
    let summary = LocalExtractor::new().workbook_summary(&path).await?;
    print!("{}", summary);
    Ok(())
}

/// Delete a document, its comments and stored files.
pub async fn cmd_delete(settings: &Settings, id: i32) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let doc = require_document(&ctx, id).await?;

    if !ctx.documents().delete(id).await? {
        anyhow::bail!("Document {} not found", id);
    }

    let store = settings.blob_store();
    for (kind, path) in [
        (FileKind::Pdf, &doc.pdf_path),
        (FileKind::Spreadsheet, &doc.spreadsheet_path),
    ] {
        if path.is_empty() {
            continue;
        }
        if let Err(e) = store.remove(path).await {
            println!(
                "  {} Could not remove {} file {}: {}",
                style("!").yellow(),
                kind.as_str(),
                path,
                e
            );
        }
    }

    println!("{} Deleted document {}", style("✓").green(), id);
    Ok(())
}
