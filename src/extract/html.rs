//! Streaming HTML link extraction
//!
//! Built directly on the html5ever tokenizer: tokens are inspected as they
//! are produced and candidate URLs collected in document order. Malformed
//! markup never aborts tokenization; the tokenizer recovers and keeps
//! going, so extraction only ends when the input does.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

/// Attributes holding checkable URLs, per tag name
fn url_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" | "area" | "link" => &["href"],
        "img" | "source" => &["src", "srcset"],
        "iframe" | "script" | "track" => &["src"],
        "video" | "audio" => &["src", "poster"],
        "form" => &["action"],
        _ => &[],
    }
}

/// Splits a `srcset` attribute into its candidate URLs
///
/// Candidates are comma-separated; each is a URL optionally followed by a
/// width or density descriptor.
fn srcset_candidates(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
        .filter(|url| !url.is_empty())
}

/// Token sink collecting raw URL strings from start tags
struct LinkSink {
    links: Vec<String>,
}

impl TokenSink for LinkSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let tag = match token {
            Token::TagToken(tag) => tag,
            _ => return TokenSinkResult::Continue,
        };
        if tag.kind != TagKind::StartTag {
            return TokenSinkResult::Continue;
        }

        self.collect(&tag);

        // Keep the tokenizer out of markup mode inside script/style bodies
        match &*tag.name {
            "script" => TokenSinkResult::RawData(RawKind::ScriptData),
            "style" => TokenSinkResult::RawData(RawKind::Rawtext),
            _ => TokenSinkResult::Continue,
        }
    }
}

impl LinkSink {
    fn collect(&mut self, tag: &Tag) {
        let wanted = url_attributes(&tag.name);
        if wanted.is_empty() {
            return;
        }

        for attr in &tag.attrs {
            let name = &*attr.name.local;
            if !wanted.contains(&name) {
                continue;
            }
            if name == "srcset" {
                for candidate in srcset_candidates(&attr.value) {
                    self.links.push(candidate.to_string());
                }
            } else if !attr.value.trim().is_empty() {
                self.links.push(attr.value.to_string());
            }
        }
    }
}

/// Incremental HTML link extractor
///
/// Feed response chunks with [`push_chunk`](Self::push_chunk) and collect
/// the discovered URLs with [`finish`](Self::finish). Chunks may split
/// UTF-8 sequences at any byte; the remainder is carried into the next
/// chunk, and invalid bytes decode as U+FFFD.
pub struct HtmlExtractor {
    tokenizer: Tokenizer<LinkSink>,
    queue: BufferQueue,
    carry: Vec<u8>,
}

impl HtmlExtractor {
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer::new(LinkSink { links: Vec::new() }, TokenizerOpts::default()),
            queue: BufferQueue::new(),
            carry: Vec::new(),
        }
    }

    /// Feeds one chunk of (possibly mid-character) document bytes
    pub fn push_chunk(&mut self, bytes: &[u8]) {
        self.carry.extend_from_slice(bytes);

        let mut pieces: Vec<StrTendril> = Vec::new();
        let mut consumed = 0;
        loop {
            match std::str::from_utf8(&self.carry[consumed..]) {
                Ok(valid) => {
                    if !valid.is_empty() {
                        pieces.push(StrTendril::from_slice(valid));
                    }
                    consumed = self.carry.len();
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    if valid_up_to > 0 {
                        if let Ok(valid) =
                            std::str::from_utf8(&self.carry[consumed..consumed + valid_up_to])
                        {
                            pieces.push(StrTendril::from_slice(valid));
                        }
                    }
                    match e.error_len() {
                        // Invalid byte sequence: substitute and move on
                        Some(len) => {
                            pieces.push(StrTendril::from_slice("\u{FFFD}"));
                            consumed += valid_up_to + len;
                        }
                        // Incomplete sequence at the chunk boundary: carry it
                        None => {
                            consumed += valid_up_to;
                            break;
                        }
                    }
                }
            }
        }
        self.carry.drain(..consumed);

        for piece in pieces {
            self.queue.push_back(piece);
        }
        let _ = self.tokenizer.feed(&mut self.queue);
    }

    /// Ends the stream and returns the URLs in document order
    pub fn finish(mut self) -> Vec<String> {
        if !self.carry.is_empty() {
            // Truncated trailing sequence
            self.queue.push_back(StrTendril::from_slice("\u{FFFD}"));
            self.carry.clear();
        }
        let _ = self.tokenizer.feed(&mut self.queue);
        self.tokenizer.end();
        self.tokenizer.sink.links
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts all URLs from a complete HTML document
pub fn extract_html(html: &str) -> Vec<String> {
    let mut extractor = HtmlExtractor::new();
    extractor.push_chunk(html.as_bytes());
    extractor.finish()
}
