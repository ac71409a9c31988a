//! Markdown link extraction
//!
//! Markdown is rendered to HTML and fed through the streaming HTML
//! back-end, so both pipelines discover links identically.

use crate::extract::html::extract_html;
use pulldown_cmark::{html, Options, Parser};

/// Renders a Markdown document to HTML
pub fn render_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut rendered = String::new();
    html::push_html(&mut rendered, parser);
    rendered
}

/// Extracts all URLs from a Markdown document
pub fn extract_markdown(markdown: &str) -> Vec<String> {
    extract_html(&render_to_html(markdown))
}
