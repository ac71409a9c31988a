//! HTTP fetcher implementation
//!
//! This module performs one logical fetch attempt per URL:
//! - HEAD first, with a GET reissue when the server rejects HEAD
//! - GET directly when the response body is going to be extracted
//! - per-request timeout, extra headers, and user agent from the options
//! - streaming extraction of HTML bodies
//! - `file://` resolution against the local filesystem
//!
//! Retry decisions are not made here; the fetcher reports what happened
//! and the engine consults the retry policies.

use crate::config::CheckOptions;
use crate::extract::{document_kind, extract_markdown, DocumentKind, HtmlExtractor};
use crate::state::FailureDetail;
use crate::{ConfigError, ProbeError};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use bytes::Bytes;
use reqwest::{Client, Method, Response};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Statuses after which a HEAD request is reissued as GET
const HEAD_FALLBACK_STATUSES: [u16; 3] = [404, 405, 501];

/// Cap on the response-body excerpt kept in failure details
const BODY_EXCERPT_LIMIT: usize = 256;

/// What a single logical fetch attempt produced
#[derive(Debug)]
pub enum FetchOutcome {
    /// A response was received (any status)
    Response {
        /// Final HTTP status after redirects
        status: u16,

        /// Parsed numeric `retry-after` header, if present
        retry_after: Option<u64>,

        /// Diagnostic captured for statuses >= 400
        failure: Option<FailureDetail>,

        /// Raw URLs extracted from the body, in document order
        links: Vec<String>,
    },

    /// No response could be produced (DNS, connect, TLS, timeout, read)
    Transport { error: String },

    /// A `file://` target that exists
    FileFound,

    /// A `file://` target that does not exist (or is an unlisted directory)
    FileMissing,
}

/// Per-task fetch parameters, detached from the full options record
#[derive(Debug, Clone)]
pub struct FetchParams {
    /// Per-request deadline in milliseconds; 0 disables it
    pub timeout: u64,

    /// Whether Markdown bodies are extractable
    pub markdown: bool,

    /// Whether directories count as existing `file://` targets
    pub directory_listing: bool,

    /// Whether the body should be parsed for links
    pub should_extract: bool,
}

/// Builds the HTTP client shared by all fetches of one crawl
pub fn build_http_client(options: &CheckOptions) -> crate::Result<Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in &options.extra_headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ProbeError::Config(ConfigError::Validation(format!(
                "invalid header name '{name}': {e}"
            )))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ProbeError::Config(ConfigError::Validation(format!(
                "invalid header value for '{}': {e}",
                name.as_str()
            )))
        })?;
        headers.insert(name, value);
    }

    let client = Client::builder()
        .user_agent(options.user_agent())
        .default_headers(headers)
        .gzip(true)
        .brotli(true)
        .build()?;
    Ok(client)
}

/// Performs one logical attempt against an HTTP(S) URL
pub async fn fetch_url(client: &Client, url: &Url, params: &FetchParams) -> FetchOutcome {
    // The body is only useful through GET; otherwise try the cheap
    // request first and fall back when the server rejects it.
    if params.should_extract {
        return match send(client, Method::GET, url, params.timeout).await {
            Ok(response) => process_response(response, url, params, true).await,
            Err(e) => FetchOutcome::Transport {
                error: transport_error_text(&e),
            },
        };
    }

    let head = send(client, Method::HEAD, url, params.timeout).await;
    let (response, used_get) = match head {
        Ok(response) if HEAD_FALLBACK_STATUSES.contains(&response.status().as_u16()) => {
            match send(client, Method::GET, url, params.timeout).await {
                Ok(response) => (response, true),
                Err(e) => {
                    return FetchOutcome::Transport {
                        error: transport_error_text(&e),
                    }
                }
            }
        }
        Ok(response) => (response, false),
        Err(head_error) => {
            // Some servers drop HEAD on the floor entirely
            tracing::debug!("HEAD failed for {url}: {head_error}, trying GET");
            match send(client, Method::GET, url, params.timeout).await {
                Ok(response) => (response, true),
                Err(e) => {
                    return FetchOutcome::Transport {
                        error: transport_error_text(&e),
                    }
                }
            }
        }
    };

    process_response(response, url, params, used_get).await
}

/// Resolves a `file://` URL against the on-disk layout
pub async fn check_file_url(url: &Url, directory_listing: bool) -> FetchOutcome {
    let Ok(path) = url.to_file_path() else {
        return FetchOutcome::FileMissing;
    };

    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_dir() => {
            if directory_listing {
                FetchOutcome::FileFound
            } else {
                FetchOutcome::FileMissing
            }
        }
        Ok(_) => FetchOutcome::FileFound,
        Err(_) => FetchOutcome::FileMissing,
    }
}

async fn send(
    client: &Client,
    method: Method,
    url: &Url,
    timeout_ms: u64,
) -> reqwest::Result<Response> {
    let mut request = client.request(method, url.clone());
    if timeout_ms > 0 {
        request = request.timeout(Duration::from_millis(timeout_ms));
    }
    request.send().await
}

async fn process_response(
    response: Response,
    url: &Url,
    params: &FetchParams,
    used_get: bool,
) -> FetchOutcome {
    let status = response.status();
    let retry_after = parse_retry_after(response.headers());

    if status.is_success() || status.is_redirection() {
        let links = if params.should_extract && used_get {
            extract_links(response, url, params).await
        } else {
            Vec::new()
        };
        return FetchOutcome::Response {
            status: status.as_u16(),
            retry_after,
            failure: None,
            links,
        };
    }

    let failure = capture_failure(response, used_get).await;
    FetchOutcome::Response {
        status: status.as_u16(),
        retry_after,
        failure: Some(failure),
        links: Vec::new(),
    }
}

/// Streams the body through the right extractor for its document kind
async fn extract_links(response: Response, url: &Url, params: &FetchParams) -> Vec<String> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match document_kind(content_type.as_deref(), url.path(), params.markdown) {
        Some(DocumentKind::Html) => {
            let mut chunks: Vec<Bytes> = Vec::new();
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => chunks.push(bytes),
                    Err(e) => {
                        // The status already decided the link's fate; a
                        // torn body just ends extraction early.
                        tracing::debug!("body stream for {url} ended early: {e}");
                        break;
                    }
                }
            }
            // HtmlExtractor is not Send (html5ever's tokenizer uses
            // non-atomic refcounting internally), so it can't be held
            // across the await points above inside a spawned task.
            let mut extractor = HtmlExtractor::new();
            for bytes in chunks {
                extractor.push_chunk(&bytes);
            }
            extractor.finish()
        }
        Some(DocumentKind::Markdown) => match response.text().await {
            Ok(body) => extract_markdown(&body),
            Err(e) => {
                tracing::debug!("failed to read markdown body for {url}: {e}");
                Vec::new()
            }
        },
        None => Vec::new(),
    }
}

/// Snapshot of a failed response: status, headers, and a short body excerpt
async fn capture_failure(response: Response, read_body: bool) -> FailureDetail {
    let status = response.status().as_u16();

    let mut headers = BTreeMap::new();
    for (name, value) in response.headers() {
        if let Ok(value) = value.to_str() {
            headers.insert(name.to_string(), value.to_string());
        }
    }

    let body_excerpt = if read_body {
        let mut buffer: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(Ok(chunk)) = stream.next().await {
            buffer.extend_from_slice(&chunk);
            if buffer.len() >= BODY_EXCERPT_LIMIT {
                buffer.truncate(BODY_EXCERPT_LIMIT);
                break;
            }
        }
        if buffer.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&buffer).into_owned())
        }
    } else {
        None
    };

    FailureDetail {
        status: Some(status),
        headers,
        message: None,
        body_excerpt,
    }
}

/// Parses a numeric `retry-after` header; HTTP-date forms are ignored
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

fn transport_error_text(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else if e.is_redirect() {
        format!("redirect limit exceeded: {e}")
    } else {
        e.to_string()
    }
}
