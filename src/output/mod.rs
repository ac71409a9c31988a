//! Output writers for crawl results
//!
//! Three formats are supported: human-readable text with per-link lines
//! and a final summary, a JSON dump of the aggregate, and CSV with one
//! row per link.

mod csv_output;
mod json;
mod text;

pub use csv_output::write_csv;
pub use json::write_json;
pub use text::{format_link_line, write_summary};

use thiserror::Error;

/// Errors that can occur while writing results
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
