//! Link extraction from HTML and Markdown documents
//!
//! The HTML back-end is a streaming tokenizer: it consumes byte chunks as
//! they arrive and never materializes a DOM, so memory stays bounded for
//! arbitrarily large documents. The Markdown front-end renders to HTML and
//! reuses the same back-end.

mod html;
mod markdown;

pub use html::{extract_html, HtmlExtractor};
pub use markdown::{extract_markdown, render_to_html};

/// Kind of document the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    Markdown,
}

/// Determines whether a response body should be parsed for links
///
/// HTML is always extractable. Markdown is extractable only when the
/// `markdown` option is set, and is recognized by MIME type or by the
/// `.md` / `.markdown` path extension (some servers hand Markdown out as
/// `text/plain`).
pub fn document_kind(
    content_type: Option<&str>,
    path: &str,
    markdown_enabled: bool,
) -> Option<DocumentKind> {
    if let Some(content_type) = content_type {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        if essence == "text/html" || essence == "application/xhtml+xml" {
            return Some(DocumentKind::Html);
        }
        if markdown_enabled && (essence == "text/markdown" || essence == "text/x-markdown") {
            return Some(DocumentKind::Markdown);
        }
    }

    let path = path.to_ascii_lowercase();
    if markdown_enabled && (path.ends_with(".md") || path.ends_with(".markdown")) {
        return Some(DocumentKind::Markdown);
    }

    None
}
