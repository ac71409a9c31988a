use crate::config::types::{CheckOptions, LinksToSkip};
use crate::ConfigError;
use regex::Regex;

/// Validates the options record before a crawl starts
///
/// Per-link concerns (unreachable hosts, broken targets) are never
/// validation errors; this only rejects option shapes the engine cannot
/// run with.
pub fn validate(options: &CheckOptions) -> Result<(), ConfigError> {
    if options.path.is_empty() {
        return Err(ConfigError::Validation(
            "at least one path is required".to_string(),
        ));
    }

    for path in &options.path {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "paths cannot be empty strings".to_string(),
            ));
        }
    }

    if options.concurrency == 0 {
        return Err(ConfigError::Validation(
            "concurrency must be a positive integer".to_string(),
        ));
    }

    if options.retry_no_header_count < -1 {
        return Err(ConfigError::Validation(format!(
            "retry_no_header_count must be >= -1, got {}",
            options.retry_no_header_count
        )));
    }

    if let LinksToSkip::Patterns(patterns) = &options.links_to_skip {
        for pattern in patterns {
            Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        }
    }

    for (name, _) in &options.extra_headers {
        if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c == ':') {
            return Err(ConfigError::Validation(format!(
                "invalid header name '{name}'"
            )));
        }
    }

    Ok(())
}
