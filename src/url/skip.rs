use crate::config::{LinksToSkip, SkipPredicate};
use crate::ConfigError;
use regex::Regex;

/// Decides whether a URL is excluded from checking
///
/// Built once per crawl from the options record; regex patterns are
/// compiled up front so a bad pattern fails the check before any work
/// starts.
pub struct SkipMatcher {
    regexes: Vec<Regex>,
    predicate: Option<SkipPredicate>,
}

impl std::fmt::Debug for SkipMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkipMatcher")
            .field("regexes", &self.regexes)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

impl SkipMatcher {
    pub fn new(links_to_skip: &LinksToSkip) -> Result<Self, ConfigError> {
        match links_to_skip {
            LinksToSkip::None => Ok(Self {
                regexes: Vec::new(),
                predicate: None,
            }),
            LinksToSkip::Patterns(patterns) => {
                let regexes = patterns
                    .iter()
                    .map(|p| {
                        Regex::new(p).map_err(|e| ConfigError::InvalidRegex {
                            pattern: p.clone(),
                            message: e.to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self {
                    regexes,
                    predicate: None,
                })
            }
            LinksToSkip::Predicate(predicate) => Ok(Self {
                regexes: Vec::new(),
                predicate: Some(predicate.clone()),
            }),
        }
    }

    /// Returns true if the URL should be skipped
    ///
    /// Regex evaluation is unanchored and short-circuits on the first
    /// match. A predicate error counts as a skip, never as a broken link.
    pub async fn is_skipped(&self, url: &str) -> bool {
        if self.regexes.iter().any(|r| r.is_match(url)) {
            return true;
        }

        if let Some(predicate) = &self.predicate {
            return match predicate(url).await {
                Ok(skip) => skip,
                Err(e) => {
                    tracing::debug!("skip predicate failed for {url}: {e}; skipping link");
                    true
                }
            };
        }

        false
    }
}
