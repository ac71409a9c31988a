use crate::config::UrlRewriteRule;
use thiserror::Error;
use url::Url;

/// Why a discovered link could not be turned into a checkable URL
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("failed to parse '{raw}': {source}")]
    Parse {
        raw: String,
        source: url::ParseError,
    },
}

/// Applies every rewrite rule, in order, to a raw URL string
///
/// Rules run on the text exactly as it appeared in the document, before
/// the string is resolved against its parent.
pub fn apply_rewrites(raw: &str, rules: &[UrlRewriteRule]) -> String {
    let mut current = raw.to_string();
    for rule in rules {
        current = rule
            .pattern
            .replace_all(&current, rule.replacement.as_str())
            .into_owned();
    }
    current
}

/// Normalizes a discovered link against its parent document
///
/// Steps, in order:
/// 1. Apply rewrite rules to the raw string
/// 2. Resolve relative to the parent URL (RFC 3986 join); absolute
///    strings ignore the parent
/// 3. Strip the fragment
///
/// Scheme classification and in-scope testing happen afterwards on the
/// returned URL; they are not normalization concerns.
pub fn normalize_link(
    raw: &str,
    parent: Option<&Url>,
    rules: &[UrlRewriteRule],
) -> Result<Url, NormalizeError> {
    let rewritten = apply_rewrites(raw.trim(), rules);

    let mut resolved = match parent {
        Some(base) => base.join(&rewritten),
        None => Url::parse(&rewritten),
    }
    .map_err(|source| NormalizeError::Parse {
        raw: rewritten.clone(),
        source,
    })?;

    resolved.set_fragment(None);
    Ok(resolved)
}
