//! Aggregate crawl result and retry notifications

use crate::state::{LinkResult, LinkState};
use serde::{Deserialize, Serialize};

/// Aggregate returned by `check`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    /// True iff no link finalized as BROKEN
    pub passed: bool,

    /// One entry per unique normalized URL visited
    pub links: Vec<LinkResult>,
}

impl CrawlResult {
    /// Builds the aggregate from finalized links
    ///
    /// `passed` is a pure function of the link vector.
    pub fn from_links(links: Vec<LinkResult>) -> Self {
        let passed = !links.iter().any(|l| l.state == LinkState::Broken);
        Self { passed, links }
    }

    /// Number of links in the given state
    pub fn count(&self, state: LinkState) -> usize {
        self.links.iter().filter(|l| l.state == state).count()
    }
}

/// Notification emitted each time a URL is scheduled for a retry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryInfo {
    /// The URL awaiting retry
    pub url: String,

    /// Delay until the retry becomes dispatchable
    pub seconds_until_retry: f64,

    /// Status of the attempt that triggered the retry, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}
