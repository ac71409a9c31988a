use futures::future::BoxFuture;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default maximum number of in-flight fetches
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Default number of retries for 429 responses without a `retry-after` header
pub const DEFAULT_RETRY_NO_HEADER_COUNT: i64 = 5;

/// Default fixed delay between no-header 429 retries (milliseconds)
pub const DEFAULT_RETRY_NO_HEADER_DELAY_MS: u64 = 60_000;

/// Default number of retries for 5xx responses and network errors
pub const DEFAULT_RETRY_ERRORS_COUNT: u32 = 5;

/// Default jitter bound added to the exponential error backoff (milliseconds)
pub const DEFAULT_RETRY_ERRORS_JITTER_MS: u64 = 3_000;

/// Default `User-Agent` sent with every outbound request
pub const DEFAULT_USER_AGENT: &str = concat!("linkprobe/", env!("CARGO_PKG_VERSION"));

/// Async predicate deciding whether a URL should be skipped
///
/// Errors returned by the predicate mark the link SKIPPED, never BROKEN.
pub type SkipPredicate = Arc<
    dyn Fn(&str) -> BoxFuture<'static, Result<bool, Box<dyn std::error::Error + Send + Sync>>>
        + Send
        + Sync,
>;

/// Links-to-skip configuration: a list of regex strings or a predicate
#[derive(Clone, Default)]
pub enum LinksToSkip {
    /// No skip rules
    #[default]
    None,

    /// Skip a URL when any regex finds a match anywhere in it
    Patterns(Vec<String>),

    /// Skip a URL when the predicate resolves to true
    Predicate(SkipPredicate),
}

impl fmt::Debug for LinksToSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("LinksToSkip::None"),
            Self::Patterns(p) => f.debug_tuple("LinksToSkip::Patterns").field(p).finish(),
            Self::Predicate(_) => f.write_str("LinksToSkip::Predicate(..)"),
        }
    }
}

/// A rewrite rule applied in order to every URL before classification
#[derive(Debug, Clone)]
pub struct UrlRewriteRule {
    /// Pattern matched against the raw URL string
    pub pattern: Regex,

    /// Replacement text; `$n` capture references are honored
    pub replacement: String,
}

/// Validated configuration record consumed by the crawler engine
///
/// Construct with struct-update syntax over [`Default::default`] and run
/// [`crate::config::validate`] before handing it to `check` (the engine
/// validates again on entry).
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Seed URLs or local filesystem paths (required, non-empty)
    pub path: Vec<String>,

    /// Maximum number of in-flight fetches
    pub concurrency: usize,

    /// Per-request deadline in milliseconds; 0 disables the deadline
    pub timeout: u64,

    /// Follow links on the same root origin as a seed
    pub recurse: bool,

    /// Treat Markdown documents as extractable inputs
    pub markdown: bool,

    /// Serve generated index pages for directories
    pub directory_listing: bool,

    /// Filesystem root for the static server; defaults to the first path
    pub server_root: Option<PathBuf>,

    /// Skip rules
    pub links_to_skip: LinksToSkip,

    /// Retry 429 responses that carry a `retry-after` header
    pub retry: bool,

    /// Retry 429 responses without a `retry-after` header
    pub retry_no_header: bool,

    /// Retry budget for no-header 429s; -1 means unbounded
    pub retry_no_header_count: i64,

    /// Fixed delay between no-header 429 retries (milliseconds)
    pub retry_no_header_delay: u64,

    /// Retry 5xx responses and network errors
    pub retry_errors: bool,

    /// Retry budget for 5xx/network errors
    pub retry_errors_count: u32,

    /// Upper bound of the uniform jitter added to error backoff (milliseconds)
    pub retry_errors_jitter: u64,

    /// Headers added to every outbound request
    pub extra_headers: Vec<(String, String)>,

    /// Request `User-Agent`; defaults to `linkprobe/<version>`
    pub user_agent: Option<String>,

    /// Rewrite rules applied to every URL before classification
    pub url_rewrites: Vec<UrlRewriteRule>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            path: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: 0,
            recurse: false,
            markdown: false,
            directory_listing: false,
            server_root: None,
            links_to_skip: LinksToSkip::None,
            retry: false,
            retry_no_header: false,
            retry_no_header_count: DEFAULT_RETRY_NO_HEADER_COUNT,
            retry_no_header_delay: DEFAULT_RETRY_NO_HEADER_DELAY_MS,
            retry_errors: false,
            retry_errors_count: DEFAULT_RETRY_ERRORS_COUNT,
            retry_errors_jitter: DEFAULT_RETRY_ERRORS_JITTER_MS,
            extra_headers: Vec::new(),
            user_agent: None,
            url_rewrites: Vec::new(),
        }
    }
}

impl CheckOptions {
    /// The effective `User-Agent` string
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}
