//! Linkprobe: a concurrent broken-link checker
//!
//! This crate crawls one or more starting locations (remote URLs or local
//! filesystem paths), extracts hyperlinks from HTML and Markdown documents,
//! fetches every discovered target, and reports whether it resolved.
//!
//! # Example
//!
//! ```no_run
//! use linkprobe::{check, CheckOptions};
//!
//! # async fn example() -> linkprobe::Result<()> {
//! let options = CheckOptions {
//!     path: vec!["https://example.com".to_string()],
//!     recurse: true,
//!     ..Default::default()
//! };
//! let result = check(options).await?;
//! assert!(result.passed);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crawler;
pub mod event;
pub mod extract;
pub mod output;
pub mod server;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for linkprobe operations
///
/// Per-link failures never surface here; they are reported through
/// [`state::LinkResult`] records. Only configuration problems and fatal
/// setup failures (server bind, missing seed path) abort a check.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Seed path does not exist: {path}")]
    SeedNotFound { path: String },

    #[error("Invalid seed '{seed}': {message}")]
    InvalidSeed { seed: String, message: String },

    #[error("Failed to start static file server: {0}")]
    ServerBind(#[source] std::io::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid regular expression '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },
}

/// Result type alias for linkprobe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{CheckOptions, LinksToSkip, UrlRewriteRule};
pub use crawler::{check, LinkChecker};
pub use state::{CrawlResult, FailureDetail, LinkResult, LinkState, RetryInfo};
