//! Per-URL state definitions and the per-link result record

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Final state of a checked link
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkState {
    /// The target resolved with a 2xx/3xx status (or an existing file)
    Ok,

    /// The final status was >= 400, or no response could be produced
    Broken,

    /// The link was excluded before any request was issued
    /// (unsupported scheme, or a skip rule matched)
    Skipped,
}

impl LinkState {
    /// Returns true if this state counts against `CrawlResult::passed`
    pub fn is_broken(&self) -> bool {
        matches!(self, Self::Broken)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Broken => "BROKEN",
            Self::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic captured for one failed fetch attempt
///
/// Retry attempts append to a link's detail list; earlier entries are
/// never replaced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDetail {
    /// HTTP status of the attempt, if a response was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Response headers of the attempt
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Transport-level error text, when no response was produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Leading bytes of the response body, when one was read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_excerpt: Option<String>,
}

impl FailureDetail {
    /// Detail for a transport failure (DNS, connect, TLS, read)
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// The record produced for every URL visited during a crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResult {
    /// Absolute URL after rewrite rules were applied
    pub url: String,

    /// Final HTTP status, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Final state of the link
    pub state: LinkState,

    /// URL or filesystem path of the document that referenced this link;
    /// `None` for seed items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Per-attempt diagnostics for broken links
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_details: Vec<FailureDetail>,
}

impl LinkResult {
    pub fn is_broken(&self) -> bool {
        self.state.is_broken()
    }
}
