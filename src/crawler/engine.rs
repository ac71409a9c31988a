//! Crawl orchestration
//!
//! The engine owns all mutable crawl state: the pending queue, the
//! dedupe cache, the retry queue, and the set of in-flight fetch tasks.
//! Fetches run as spawned tasks for I/O parallelism; every state
//! transition happens on the engine loop, so results, events, and queue
//! mutations never race.
//!
//! Per-URL state machine:
//!
//! ```text
//! DISCOVERED -> QUEUED -> IN_FLIGHT -> {OK | BROKEN | SCHEDULED_RETRY}
//! SCHEDULED_RETRY -> QUEUED (when due)
//! ```

use crate::config::{validate, CheckOptions};
use crate::crawler::fetcher::{self, FetchOutcome, FetchParams};
use crate::crawler::retry::{decide_error, decide_http_429, RetryDecision, RetryQueue};
use crate::event::EventBus;
use crate::server::StaticServer;
use crate::state::{CrawlResult, FailureDetail, LinkResult, LinkState, RetryInfo};
use crate::url::{classify_scheme, normalize_link, SkipMatcher, UrlKey, UrlKind};
use crate::{ProbeError, Result};
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::{Origin, Url};

/// A unit of crawl work flowing through the state machine
#[derive(Debug, Clone)]
pub struct CrawlItem {
    /// Normalized target URL
    pub url: Url,

    /// Referencing document; `None` for seeds
    pub parent: Option<String>,

    /// Seeds are always extracted, regardless of the recursion policy
    pub is_seed: bool,

    /// Completed attempts so far
    pub attempt: u32,

    /// Diagnostics accumulated across attempts
    pub failures: Vec<FailureDetail>,
}

struct TaskOutput {
    item: CrawlItem,
    outcome: FetchOutcome,
}

/// Engine handle: register listeners, then run `check`
///
/// Listeners must be registered before calling [`check`](Self::check);
/// the bus is not mutated during a crawl.
pub struct LinkChecker {
    bus: EventBus,
}

impl LinkChecker {
    pub fn new() -> Self {
        Self {
            bus: EventBus::new(),
        }
    }

    /// Registers a listener fired once per URL at finalization
    pub fn on_link(&mut self, listener: impl Fn(&LinkResult) + Send + Sync + 'static) {
        self.bus.on_link(listener);
    }

    /// Registers a listener fired at each retry scheduling
    pub fn on_retry(&mut self, listener: impl Fn(&RetryInfo) + Send + Sync + 'static) {
        self.bus.on_retry(listener);
    }

    /// Crawls the configured seeds to completion
    pub async fn check(&self, options: CheckOptions) -> Result<CrawlResult> {
        self.check_with_cancellation(options, CancellationToken::new())
            .await
    }

    /// Crawls the configured seeds, stopping early when `cancel` fires
    ///
    /// On cancellation, in-flight fetches are aborted, the retry queue is
    /// cleared, and the result covers only the URLs finalized so far.
    pub async fn check_with_cancellation(
        &self,
        options: CheckOptions,
        cancel: CancellationToken,
    ) -> Result<CrawlResult> {
        validate(&options)?;
        let skip = SkipMatcher::new(&options.links_to_skip)?;
        let client = fetcher::build_http_client(&options)?;

        let (seed_strings, server) = resolve_seeds(&options).await?;

        let mut seeds: Vec<Url> = Vec::with_capacity(seed_strings.len());
        for seed in &seed_strings {
            let url = normalize_link(seed, None, &options.url_rewrites).map_err(|e| {
                ProbeError::InvalidSeed {
                    seed: seed.clone(),
                    message: e.to_string(),
                }
            })?;
            seeds.push(url);
        }
        let seed_origins: HashSet<Origin> = seeds.iter().map(Url::origin).collect();

        let mut crawl = Crawl {
            options: &options,
            client,
            bus: &self.bus,
            skip,
            seen: HashSet::new(),
            invalid_seen: HashSet::new(),
            pending: VecDeque::new(),
            retries: RetryQueue::new(),
            in_flight: JoinSet::new(),
            results: Vec::new(),
            seed_origins,
        };
        let result = crawl.run(seeds, cancel).await;

        if let Some(server) = server {
            server.shutdown().await;
        }
        Ok(result)
    }
}

impl Default for LinkChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-shot helper: construct a checker and crawl once
pub async fn check(options: CheckOptions) -> Result<CrawlResult> {
    LinkChecker::new().check(options).await
}

fn is_url_seed(entry: &str) -> bool {
    entry.starts_with("http://") || entry.starts_with("https://") || entry.starts_with("file://")
}

/// Resolves the `path` entries into crawlable seed URLs
///
/// The first local filesystem entry determines the static-server root
/// (unless `server_root` overrides it); every local entry is rewritten to
/// the server origin plus its root-relative path. Missing paths and roots
/// fail the check before any crawling starts.
async fn resolve_seeds(options: &CheckOptions) -> Result<(Vec<String>, Option<StaticServer>)> {
    let mut seeds = Vec::with_capacity(options.path.len());
    let mut local_ctx: Option<(StaticServer, PathBuf)> = None;

    for entry in &options.path {
        if is_url_seed(entry) {
            seeds.push(entry.clone());
            continue;
        }

        let path = PathBuf::from(entry);
        if !path.exists() {
            return Err(ProbeError::SeedNotFound {
                path: entry.clone(),
            });
        }
        let canonical = path.canonicalize()?;

        if local_ctx.is_none() {
            let serve_root = match &options.server_root {
                Some(root) => {
                    if !root.exists() {
                        return Err(ProbeError::SeedNotFound {
                            path: root.display().to_string(),
                        });
                    }
                    root.canonicalize()?
                }
                None if canonical.is_dir() => canonical.clone(),
                None => canonical
                    .parent()
                    .unwrap_or_else(|| std::path::Path::new("/"))
                    .to_path_buf(),
            };
            let server = StaticServer::start(serve_root.clone(), options.directory_listing).await?;
            local_ctx = Some((server, serve_root));
        }

        if let Some((server, root)) = &local_ctx {
            let relative = canonical.strip_prefix(root).map_err(|_| ProbeError::InvalidSeed {
                seed: entry.clone(),
                message: format!("path is outside the server root {}", root.display()),
            })?;
            seeds.push(format!(
                "{}/{}",
                server.origin(),
                relative.to_string_lossy().replace('\\', "/")
            ));
        }
    }

    Ok((seeds, local_ctx.map(|(server, _)| server)))
}

/// Per-invocation crawl state; lives exactly as long as one `check` call
struct Crawl<'a> {
    options: &'a CheckOptions,
    client: reqwest::Client,
    bus: &'a EventBus,
    skip: SkipMatcher,

    /// Dedupe cache; authoritative for result uniqueness
    seen: HashSet<UrlKey>,

    /// Unparseable raw links already reported
    invalid_seen: HashSet<String>,

    pending: VecDeque<CrawlItem>,
    retries: RetryQueue,
    in_flight: JoinSet<TaskOutput>,
    results: Vec<LinkResult>,
    seed_origins: HashSet<Origin>,
}

impl Crawl<'_> {
    async fn run(&mut self, seeds: Vec<Url>, cancel: CancellationToken) -> CrawlResult {
        for seed in seeds {
            self.admit(seed, None, true).await;
        }

        loop {
            if cancel.is_cancelled() {
                break;
            }

            while self.in_flight.len() < self.options.concurrency {
                match self.pending.pop_front() {
                    Some(item) => self.spawn(item),
                    None => break,
                }
            }

            if self.pending.is_empty() && self.in_flight.is_empty() && self.retries.is_empty() {
                break;
            }

            let next_due = self.retries.next_due_at();
            tokio::select! {
                _ = cancel.cancelled() => break,
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    match joined {
                        Ok(output) => self.handle_output(output).await,
                        Err(e) => tracing::warn!("fetch task aborted: {e}"),
                    }
                }
                _ = sleep_until_next(next_due), if next_due.is_some() => {
                    let now = Instant::now();
                    while let Some(item) = self.retries.pop_due(now) {
                        self.pending.push_back(item);
                    }
                }
            }
        }

        if cancel.is_cancelled() {
            tracing::debug!(
                "crawl cancelled; dropping {} in-flight and {} scheduled fetches",
                self.in_flight.len(),
                self.retries.len()
            );
            self.in_flight.abort_all();
            self.retries.clear();
        }

        CrawlResult::from_links(std::mem::take(&mut self.results))
    }

    /// Runs a normalized URL through dedupe, scheme, and skip checks, then
    /// queues it for fetching
    async fn admit(&mut self, url: Url, parent: Option<String>, is_seed: bool) {
        if !self.seen.insert(UrlKey::of(&url)) {
            // One result per URL; the first observed parent wins
            return;
        }

        if classify_scheme(&url) == UrlKind::Unsupported {
            self.finalize(LinkResult {
                url: url.to_string(),
                status: None,
                state: LinkState::Skipped,
                parent,
                failure_details: Vec::new(),
            });
            return;
        }

        if self.skip.is_skipped(url.as_str()).await {
            tracing::debug!("skipping {url}");
            self.finalize(LinkResult {
                url: url.to_string(),
                status: None,
                state: LinkState::Skipped,
                parent,
                failure_details: Vec::new(),
            });
            return;
        }

        self.pending.push_back(CrawlItem {
            url,
            parent,
            is_seed,
            attempt: 0,
            failures: Vec::new(),
        });
    }

    fn spawn(&mut self, item: CrawlItem) {
        let client = self.client.clone();
        let should_extract = item.is_seed
            || (self.options.recurse && self.seed_origins.contains(&item.url.origin()));
        let params = FetchParams {
            timeout: self.options.timeout,
            markdown: self.options.markdown,
            directory_listing: self.options.directory_listing,
            should_extract,
        };

        self.in_flight.spawn(async move {
            let outcome = match classify_scheme(&item.url) {
                UrlKind::File => fetcher::check_file_url(&item.url, params.directory_listing).await,
                _ => fetcher::fetch_url(&client, &item.url, &params).await,
            };
            TaskOutput { item, outcome }
        });
    }

    async fn handle_output(&mut self, output: TaskOutput) {
        let TaskOutput { mut item, outcome } = output;

        match outcome {
            FetchOutcome::FileFound => {
                self.finalize(LinkResult {
                    url: item.url.to_string(),
                    status: Some(200),
                    state: LinkState::Ok,
                    parent: item.parent,
                    failure_details: item.failures,
                });
            }
            FetchOutcome::FileMissing => {
                item.failures.push(FailureDetail {
                    status: Some(404),
                    message: Some("path does not exist".to_string()),
                    ..Default::default()
                });
                self.finalize(LinkResult {
                    url: item.url.to_string(),
                    status: Some(404),
                    state: LinkState::Broken,
                    parent: item.parent,
                    failure_details: item.failures,
                });
            }
            FetchOutcome::Transport { error } => {
                item.failures.push(FailureDetail::from_error(error));
                match decide_error(self.options, item.attempt) {
                    RetryDecision::Schedule { delay } => self.schedule_retry(item, delay, None),
                    RetryDecision::GiveUp => {
                        self.finalize(LinkResult {
                            url: item.url.to_string(),
                            status: None,
                            state: LinkState::Broken,
                            parent: item.parent,
                            failure_details: item.failures,
                        });
                    }
                }
            }
            FetchOutcome::Response {
                status,
                retry_after,
                failure,
                links,
            } => {
                if let Some(failure) = failure {
                    item.failures.push(failure);
                }

                if status < 400 {
                    let parent_url = item.url.clone();
                    let parent_str = item.url.to_string();
                    self.finalize(LinkResult {
                        url: parent_str.clone(),
                        status: Some(status),
                        state: LinkState::Ok,
                        parent: item.parent,
                        failure_details: item.failures,
                    });
                    for raw in links {
                        self.discovered(&raw, &parent_url, &parent_str).await;
                    }
                } else if status == 429 {
                    match decide_http_429(self.options, item.attempt, retry_after) {
                        RetryDecision::Schedule { delay } => {
                            self.schedule_retry(item, delay, Some(status));
                        }
                        RetryDecision::GiveUp => self.finalize_broken(item, status),
                    }
                } else if (500..600).contains(&status) {
                    match decide_error(self.options, item.attempt) {
                        RetryDecision::Schedule { delay } => {
                            self.schedule_retry(item, delay, Some(status));
                        }
                        RetryDecision::GiveUp => self.finalize_broken(item, status),
                    }
                } else {
                    self.finalize_broken(item, status);
                }
            }
        }
    }

    /// Normalizes one extracted link and admits it into the queue
    async fn discovered(&mut self, raw: &str, parent: &Url, parent_str: &str) {
        match normalize_link(raw, Some(parent), &self.options.url_rewrites) {
            Ok(url) => self.admit(url, Some(parent_str.to_string()), false).await,
            Err(e) => {
                if self.invalid_seen.insert(raw.to_string()) {
                    self.finalize(LinkResult {
                        url: raw.to_string(),
                        status: None,
                        state: LinkState::Broken,
                        parent: Some(parent_str.to_string()),
                        failure_details: vec![FailureDetail::from_error(e.to_string())],
                    });
                }
            }
        }
    }

    fn schedule_retry(&mut self, mut item: CrawlItem, delay: Duration, status: Option<u16>) {
        let info = RetryInfo {
            url: item.url.to_string(),
            seconds_until_retry: delay.as_secs_f64(),
            status,
        };
        tracing::debug!(
            "retrying {} in {:.1}s (attempt {})",
            info.url,
            info.seconds_until_retry,
            item.attempt + 1
        );
        item.attempt += 1;
        self.retries.schedule(item, delay);
        self.bus.emit_retry(&info);
    }

    fn finalize_broken(&mut self, item: CrawlItem, status: u16) {
        self.finalize(LinkResult {
            url: item.url.to_string(),
            status: Some(status),
            state: LinkState::Broken,
            parent: item.parent,
            failure_details: item.failures,
        });
    }

    /// Records a final state and emits the `link` event, exactly once per URL
    fn finalize(&mut self, result: LinkResult) {
        tracing::debug!("{} {} (status {:?})", result.state, result.url, result.status);
        self.bus.emit_link(&result);
        self.results.push(result);
    }
}

async fn sleep_until_next(due: Option<Instant>) {
    match due {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
