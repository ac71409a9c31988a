//! URL handling module for linkprobe
//!
//! This module provides rewrite-and-resolve normalization, transport
//! scheme classification, the structural dedupe key, and skip matching.

mod normalize;
mod skip;

pub use normalize::{apply_rewrites, normalize_link, NormalizeError};
pub use skip::SkipMatcher;

use url::Url;

/// Transport classification of a normalized URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlKind {
    /// `http` / `https` - checked with an outbound request
    Http,

    /// `file` - checked against the local filesystem
    File,

    /// Everything else (`mailto`, `tel`, `javascript`, `data`, ...) -
    /// finalized as SKIPPED without any request
    Unsupported,
}

impl UrlKind {
    pub fn is_fetchable(&self) -> bool {
        matches!(self, Self::Http)
    }
}

/// Classifies a URL by its scheme
pub fn classify_scheme(url: &Url) -> UrlKind {
    match url.scheme() {
        "http" | "https" => UrlKind::Http,
        "file" => UrlKind::File,
        _ => UrlKind::Unsupported,
    }
}

/// Structural identity of a URL within one crawl
///
/// Two URLs are the same link iff scheme, host, effective port, path and
/// query all agree. This is the dedupe-cache key; it deliberately ignores
/// fragments (already stripped) and textual differences such as a default
/// port spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlKey {
    scheme: String,
    host: Option<String>,
    port: Option<u16>,
    path: String,
    query: Option<String>,
}

impl UrlKey {
    pub fn of(url: &Url) -> Self {
        Self {
            scheme: url.scheme().to_string(),
            host: url.host_str().map(str::to_string),
            port: url.port_or_known_default(),
            path: url.path().to_string(),
            query: url.query().map(str::to_string),
        }
    }
}
