//! marginalia - document upload, extraction and annotation backend.
//!
//! Uploaded PDFs and spreadsheets are stored on disk and recorded as
//! documents in SQLite. A background sweep moves each document from
//! `pending` through `processing` to `completed` or `failed` by running
//! text extraction on it. Users attach positioned comments to pages.

pub mod cli;
pub mod config;
pub mod extraction;
pub mod migrations;
pub mod models;
pub mod repository;
pub mod schema;
pub mod services;
pub mod storage;
pub mod work_queue;
