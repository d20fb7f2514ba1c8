//! Comment commands.

use console::style;

use crate::cli::helpers::{default_user, open_context, require_document};
use crate::config::Settings;
use crate::models::Comment;

/// Add a comment to a document page.
pub async fn cmd_comment_add(
    settings: &Settings,
    id: i32,
    body: &str,
    page: i32,
    x: f64,
    y: f64,
    user: Option<&str>,
) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let author = user.map(String::from).unwrap_or_else(default_user);

    let comment = Comment::new(id, page, x, y, body.to_string(), author);
    let stored = ctx.comments().create(&comment).await?;

    println!(
        "{} Added comment {} to document {} page {}",
        style("✓").green(),
        stored.id,
        id,
        page
    );
    Ok(())
}

/// List comments on a document, newest first.
pub async fn cmd_comment_list(settings: &Settings, id: i32) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    require_document(&ctx, id).await?;
    let comments = ctx.comments().list_for_document(id).await?;

    if comments.is_empty() {
        println!("{} No comments on document {}", style("!").yellow(), id);
        return Ok(());
    }

    for c in &comments {
        println!(
            "{:>5}  p{:<4} {} {}",
            c.id,
            c.page_number,
            c.created_at.format("%Y-%m-%d %H:%M:%S"),
            style(&c.created_by).cyan()
        );
        println!("       {}", c.body);
    }
    Ok(())
}
