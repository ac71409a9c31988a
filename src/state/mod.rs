//! Result data model for a crawl
//!
//! This module defines the per-URL result records emitted during a crawl
//! and the aggregate returned by `check`.

mod link;
mod result;

pub use link::{FailureDetail, LinkResult, LinkState};
pub use result::{CrawlResult, RetryInfo};
