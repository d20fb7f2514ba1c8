//! Command-line interface for marginalia.

mod commands;
pub mod helpers;

pub use commands::{is_verbose, run};
