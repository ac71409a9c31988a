//! Crawler module: fetching, retry policies, and orchestration
//!
//! This module contains the core crawling logic:
//! - HTTP fetching with HEAD-to-GET fallback and streaming extraction
//! - The two retry policies and the delay-ordered retry queue
//! - The engine that owns queues, dedupe cache, and the dispatcher

mod engine;
mod fetcher;
mod retry;

pub use engine::{check, CrawlItem, LinkChecker};
pub use fetcher::{build_http_client, check_file_url, fetch_url, FetchOutcome, FetchParams};
pub use retry::{decide_error, decide_http_429, RetryDecision, RetryQueue};
