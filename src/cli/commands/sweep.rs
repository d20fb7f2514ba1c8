//! Background processing commands.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cli::helpers::{open_context, truncate};
use crate::config::Settings;
use crate::extraction::LocalExtractor;
use crate::repository::DbContext;
use crate::services::LifecycleManager;
use crate::work_queue::{DbPendingQueue, SweepEvent, SweepRunner};

fn build_runner(settings: &Settings, ctx: &DbContext) -> SweepRunner<DbPendingQueue> {
    let manager = LifecycleManager::new(
        DbPendingQueue::new(ctx.documents()),
        Arc::new(LocalExtractor::new()),
        settings.blob_store(),
    );
    SweepRunner::new(manager)
}

fn print_event(event: &SweepEvent) {
    match event {
        SweepEvent::CycleStarted { discovered } => {
            println!("{} {} pending documents", style("→").cyan(), discovered)
        }
        SweepEvent::DocumentStarted { document_id, name } => {
            println!("  {} [{}] {}", style("→").dim(), document_id, truncate(name, 50))
        }
        SweepEvent::DocumentCompleted { document_id } => {
            println!("  {} [{}] completed", style("✓").green(), document_id)
        }
        SweepEvent::DocumentSkipped { document_id } => {
            println!("  {} [{}] skipped", style("-").dim(), document_id)
        }
        SweepEvent::DocumentFailed { document_id, error } => {
            println!("  {} [{}] {}", style("✗").red(), document_id, error)
        }
        SweepEvent::DiscoveryFailed { error } => {
            println!("{} {}", style("✗").red(), error)
        }
        SweepEvent::CycleCompleted { report } => println!(
            "{} {} completed, {} failed, {} skipped",
            style("✓").green(),
            report.completed,
            report.failed,
            report.skipped
        ),
    }
}

fn spawn_printer(mut rx: mpsc::Receiver<SweepEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    })
}

/// List pending documents.
pub async fn cmd_pending(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let pending = ctx.documents().list_pending().await?;

    if pending.is_empty() {
        println!("{} No pending documents", style("✓").green());
        return Ok(());
    }

    for doc in &pending {
        println!(
            "{:>5}  {:<11}  {}",
            doc.id,
            doc.kind.as_str(),
            truncate(doc.primary_name(), 50)
        );
    }

    let counts = ctx.documents().count_by_status().await?;
    let summary: Vec<String> = counts
        .iter()
        .map(|(status, n)| format!("{} {}", n, status))
        .collect();
    println!("\n{}", summary.join(", "));
    Ok(())
}

/// Run one sweep cycle.
pub async fn cmd_sweep(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let (tx, rx) = mpsc::channel(64);
    let printer = spawn_printer(rx);

    let report = {
        let runner = build_runner(settings, &ctx).with_events(tx);
        runner.run_cycle(&CancellationToken::new()).await
    };
    // Runner dropped, so the channel closes and the printer drains.
    let _ = printer.await;

    let report = report?;
    if report.failed > 0 {
        anyhow::bail!("{} documents failed", report.failed);
    }
    Ok(())
}

/// Sweep on an interval until Ctrl-C.
pub async fn cmd_daemon(settings: &Settings, interval_minutes: Option<u64>) -> anyhow::Result<()> {
    let ctx = open_context(settings).await?;
    let interval = match interval_minutes {
        Some(minutes) => Duration::from_secs(minutes.max(1) * 60),
        None => settings.processing_interval(),
    };

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n{} Stopping after the current document...", style("!").yellow());
            shutdown.cancel();
        }
    });

    println!(
        "{} Sweeping every {} minutes (Ctrl-C to stop)",
        style("→").cyan(),
        interval.as_secs() / 60
    );

    let (tx, rx) = mpsc::channel(256);
    let printer = spawn_printer(rx);
    {
        let runner = build_runner(settings, &ctx).with_events(tx);
        runner.run(interval, token).await;
    }
    let _ = printer.await;

    println!("{} Daemon stopped", style("✓").green());
    Ok(())
}
