//! Ephemeral static file server for local roots
//!
//! When a seed is a filesystem path, the crawl is backed by an in-process
//! HTTP server bound to an OS-chosen port on 127.0.0.1, and the seed is
//! rewritten to that origin. The server lives exactly as long as the
//! `check` call that started it. Its I/O does not count against the
//! crawl's concurrency budget.

use crate::ProbeError;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct ServerState {
    root: PathBuf,
    directory_listing: bool,
}

/// Handle to a running static file server
pub struct StaticServer {
    origin: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl StaticServer {
    /// Binds 127.0.0.1 on an ephemeral port and starts serving `root`
    pub async fn start(root: PathBuf, directory_listing: bool) -> crate::Result<Self> {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(ProbeError::ServerBind)?;
        let addr = listener.local_addr().map_err(ProbeError::ServerBind)?;

        let state = Arc::new(ServerState {
            root,
            directory_listing,
        });
        let app = Router::new().fallback(serve_path).with_state(state);

        let cancel = CancellationToken::new();
        let shutdown = cancel.clone();
        let handle = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            if let Err(e) = served {
                tracing::error!("static server error: {e}");
            }
        });

        tracing::debug!("static server listening on {addr}");
        Ok(Self {
            origin: format!("http://{addr}"),
            cancel,
            handle,
        })
    }

    /// The HTTP origin the server listens on, e.g. `http://127.0.0.1:40213`
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Tears the server down, force-closing any keep-alive connections
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        self.handle.abort();
        let _ = (&mut self.handle).await;
    }
}

impl Drop for StaticServer {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

async fn serve_path(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let request_path = uri.path();
    let Some(path) = resolve_request_path(&state.root, request_path) else {
        return not_found();
    };

    let Ok(metadata) = tokio::fs::metadata(&path).await else {
        return not_found();
    };

    if metadata.is_dir() {
        // Relative links inside a listing only resolve correctly under a
        // trailing slash, same as any file server.
        if !request_path.ends_with('/') {
            let location = format!("{request_path}/");
            return (
                StatusCode::MOVED_PERMANENTLY,
                [(header::LOCATION, location.as_str())],
            )
                .into_response();
        }

        let index = path.join("index.html");
        if tokio::fs::metadata(&index).await.is_ok() {
            return serve_file(&index).await;
        }
        if state.directory_listing {
            return serve_listing(&path, request_path).await;
        }
        return not_found();
    }

    serve_file(&path).await
}

/// Maps a request path onto the served root
///
/// Segments are percent-decoded individually; `.` is dropped and `..` is
/// rejected outright, so the result can never escape the root.
fn resolve_request_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in request_path.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            return None;
        }
        let decoded = percent_decode_str(segment).decode_utf8().ok()?;
        if decoded.contains('/') || decoded.contains('\\') || decoded == ".." {
            return None;
        }
        path.push(decoded.as_ref());
    }
    Some(path)
}

async fn serve_file(path: &Path) -> Response {
    let Ok(bytes) = tokio::fs::read(path).await else {
        return not_found();
    };
    (
        [(header::CONTENT_TYPE, content_type_for(path))],
        bytes,
    )
        .into_response()
}

/// MIME type for a served file, inferred from its extension
fn content_type_for(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some("md") | Some("markdown") => "text/markdown; charset=utf-8".to_string(),
        _ => mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string(),
    }
}

/// Generated HTML index for a directory
async fn serve_listing(path: &Path, request_path: &str) -> Response {
    let Ok(mut entries) = tokio::fs::read_dir(path).await else {
        return not_found();
    };

    let mut names: Vec<String> = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();

    let title = escape_html(request_path);
    let mut body = format!(
        "<!DOCTYPE html>\n<html><head><title>Index of {title}</title></head>\n\
         <body><h1>Index of {title}</h1>\n<ul>\n"
    );
    for name in names {
        let escaped = escape_html(&name);
        body.push_str(&format!("<li><a href=\"{escaped}\">{escaped}</a></li>\n"));
    }
    body.push_str("</ul></body></html>\n");

    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
