//! Event bus for crawl observers
//!
//! Two event streams exist: `link` fires once per URL when its final
//! state is known, and `retry` fires each time a URL is scheduled for a
//! retry. Listeners run inline in registration order. A panicking
//! listener is isolated and logged; it never corrupts engine state or
//! stops the crawl.

use crate::state::{LinkResult, RetryInfo};
use std::panic::{catch_unwind, AssertUnwindSafe};

type LinkListener = Box<dyn Fn(&LinkResult) + Send + Sync>;
type RetryListener = Box<dyn Fn(&RetryInfo) + Send + Sync>;

/// Listener registry for `link` and `retry` events
#[derive(Default)]
pub struct EventBus {
    link_listeners: Vec<LinkListener>,
    retry_listeners: Vec<RetryListener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for finalized links
    pub fn on_link(&mut self, listener: impl Fn(&LinkResult) + Send + Sync + 'static) {
        self.link_listeners.push(Box::new(listener));
    }

    /// Registers a listener for retry scheduling
    pub fn on_retry(&mut self, listener: impl Fn(&RetryInfo) + Send + Sync + 'static) {
        self.retry_listeners.push(Box::new(listener));
    }

    pub fn emit_link(&self, result: &LinkResult) {
        for listener in &self.link_listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(result))).is_err() {
                tracing::warn!("link listener panicked for {}; continuing", result.url);
            }
        }
    }

    pub fn emit_retry(&self, info: &RetryInfo) {
        for listener in &self.retry_listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(info))).is_err() {
                tracing::warn!("retry listener panicked for {}; continuing", info.url);
            }
        }
    }
}
