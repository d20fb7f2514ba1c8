//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod comments;
mod documents;
mod init;
mod sweep;

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use crate::config::{load_settings, LoadOptions};
use crate::models::DocumentStatus;

#[derive(Parser)]
#[command(name = "marginalia")]
#[command(about = "Document upload, extraction and annotation backend")]
#[command(version)]
pub struct Cli {
    /// Data directory or database file (overrides config file).
    /// Can be a directory containing marginalia.db or a .db file directly.
    #[arg(long, short = 'd', global = true)]
    data: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Upload a PDF or spreadsheet
    Upload {
        /// File to upload
        file: PathBuf,
        /// Uploader identity (defaults to $USER)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Attach a spreadsheet to an existing document
    Attach {
        /// Document ID
        id: i32,
        /// Spreadsheet to attach
        file: PathBuf,
    },

    /// List documents
    List {
        /// Only documents uploaded by this user
        #[arg(short, long)]
        user: Option<String>,
        /// Only documents in this status
        #[arg(short, long, value_parser = parse_status)]
        status: Option<DocumentStatus>,
        /// Only documents uploaded since (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_since)]
        since: Option<DateTime<Utc>>,
    },

    /// Show document details and comments
    Show {
        /// Document ID
        id: i32,
    },

    /// Print the extracted text of a PDF document
    Text {
        /// Document ID
        id: i32,
    },

    /// Print the first worksheet of a document's spreadsheet
    Table {
        /// Document ID
        id: i32,
        /// Maximum rows to print
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Summarize the worksheets of a document's spreadsheet
    Info {
        /// Document ID
        id: i32,
    },

    /// Manage comments
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },

    /// Delete a document, its comments and its files
    Delete {
        /// Document ID
        id: i32,
    },

    /// List documents waiting to be processed
    Pending,

    /// Process all pending documents once
    Sweep,

    /// Process pending documents on an interval until interrupted
    Daemon {
        /// Minutes between sweeps (overrides config)
        #[arg(short, long)]
        interval_minutes: Option<u64>,
    },
}

#[derive(Subcommand)]
enum CommentCommands {
    /// Add a comment to a page
    Add {
        /// Document ID
        id: i32,
        /// Comment text
        body: String,
        /// 1-based page number
        #[arg(short, long, default_value = "1")]
        page: i32,
        /// Horizontal position on the page
        #[arg(short, long, default_value = "0")]
        x: f64,
        /// Vertical position on the page
        #[arg(short, long, default_value = "0")]
        y: f64,
        /// Author identity (defaults to $USER)
        #[arg(short, long)]
        user: Option<String>,
    },
    /// List comments on a document, newest first
    List {
        /// Document ID
        id: i32,
    },
}

fn parse_status(s: &str) -> Result<DocumentStatus, String> {
    DocumentStatus::from_str(&s.to_lowercase()).ok_or_else(|| {
        format!("unknown status '{}' (expected pending, processing, completed or failed)", s)
    })
}

fn parse_since(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid date '{}'", s))
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        data: cli.data,
    };
    let (settings, _config) = load_settings(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Upload { file, user } => {
            documents::cmd_upload(&settings, &file, user.as_deref()).await
        }
        Commands::Attach { id, file } => documents::cmd_attach(&settings, id, &file).await,
        Commands::List {
            user,
            status,
            since,
        } => documents::cmd_list(&settings, user, status, since).await,
        Commands::Show { id } => documents::cmd_show(&settings, id).await,
        Commands::Text { id } => documents::cmd_text(&settings, id).await,
        Commands::Table { id, limit } => documents::cmd_table(&settings, id, limit).await,
        Commands::Info { id } => documents::cmd_info(&settings, id).await,
        Commands::Delete { id } => documents::cmd_delete(&settings, id).await,
        Commands::Comment { command } => match command {
            CommentCommands::Add {
                id,
                body,
                page,
                x,
                y,
                user,
            } => comments::cmd_comment_add(&settings, id, &body, page, x, y, user.as_deref()).await,
            CommentCommands::List { id } => comments::cmd_comment_list(&settings, id).await,
        },
        Commands::Pending => sweep::cmd_pending(&settings).await,
        Commands::Sweep => sweep::cmd_sweep(&settings).await,
        Commands::Daemon { interval_minutes } => {
            sweep::cmd_daemon(&settings, interval_minutes).await
        }
    }
}
