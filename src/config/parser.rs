use crate::config::types::{CheckOptions, LinksToSkip, UrlRewriteRule};
use crate::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Raw configuration file contents
///
/// Keys mirror the CLI long-form flag names. Every field is optional; a
/// value present in the file fills the corresponding option unless the
/// command line overrides it afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<u64>,
    pub recurse: Option<bool>,
    pub markdown: Option<bool>,
    pub directory_listing: Option<bool>,
    pub server_root: Option<PathBuf>,
    pub skip: Option<SkipField>,
    pub retry: Option<bool>,
    pub retry_no_header: Option<bool>,
    pub retry_no_header_count: Option<i64>,
    pub retry_no_header_delay: Option<u64>,
    pub retry_errors: Option<bool>,
    pub retry_errors_count: Option<u32>,
    pub retry_errors_jitter: Option<u64>,
    pub url_rewrite_search: Option<String>,
    pub url_rewrite_replace: Option<String>,
    pub user_agent: Option<String>,

    // Presentation settings consumed by the CLI layer, not the engine
    pub format: Option<String>,
    pub silent: Option<bool>,
    pub verbosity: Option<String>,
}

/// `skip` accepts a single pattern string or a list of patterns
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkipField {
    One(String),
    Many(Vec<String>),
}

impl SkipField {
    pub fn into_patterns(self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

impl RawConfig {
    /// Fills `options` with every value present in this file
    ///
    /// The rewrite pair is compiled here so that a bad pattern is reported
    /// as a configuration error before any work starts.
    pub fn apply_to(&self, options: &mut CheckOptions) -> Result<(), ConfigError> {
        if let Some(concurrency) = self.concurrency {
            options.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            options.timeout = timeout;
        }
        if let Some(recurse) = self.recurse {
            options.recurse = recurse;
        }
        if let Some(markdown) = self.markdown {
            options.markdown = markdown;
        }
        if let Some(directory_listing) = self.directory_listing {
            options.directory_listing = directory_listing;
        }
        if let Some(server_root) = &self.server_root {
            options.server_root = Some(server_root.clone());
        }
        if let Some(skip) = &self.skip {
            options.links_to_skip = LinksToSkip::Patterns(skip.clone().into_patterns());
        }
        if let Some(retry) = self.retry {
            options.retry = retry;
        }
        if let Some(retry_no_header) = self.retry_no_header {
            options.retry_no_header = retry_no_header;
        }
        if let Some(count) = self.retry_no_header_count {
            options.retry_no_header_count = count;
        }
        if let Some(delay) = self.retry_no_header_delay {
            options.retry_no_header_delay = delay;
        }
        if let Some(retry_errors) = self.retry_errors {
            options.retry_errors = retry_errors;
        }
        if let Some(count) = self.retry_errors_count {
            options.retry_errors_count = count;
        }
        if let Some(jitter) = self.retry_errors_jitter {
            options.retry_errors_jitter = jitter;
        }
        if let Some(user_agent) = &self.user_agent {
            options.user_agent = Some(user_agent.clone());
        }

        match (&self.url_rewrite_search, &self.url_rewrite_replace) {
            (Some(search), Some(replace)) => {
                let pattern = Regex::new(search).map_err(|e| ConfigError::InvalidRegex {
                    pattern: search.clone(),
                    message: e.to_string(),
                })?;
                options.url_rewrites.push(UrlRewriteRule {
                    pattern,
                    replacement: replace.clone(),
                });
            }
            (None, None) => {}
            _ => {
                return Err(ConfigError::Validation(
                    "urlRewriteSearch and urlRewriteReplace must be set together".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Loads and parses a configuration file from the given path
pub fn load_config(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: RawConfig = serde_json::from_str(&content)?;
    Ok(config)
}
