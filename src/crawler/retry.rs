//! Retry policies and the delay-ordered retry queue
//!
//! Two policies exist and stay separate:
//! - 429 handling: honor a numeric `retry-after` header, or apply a fixed
//!   delay when the header is absent (rate-limited APIs)
//! - 5xx/network handling: exponential backoff with uniform jitter
//!   (transient failures)

use crate::config::CheckOptions;
use crate::crawler::engine::CrawlItem;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;
use tokio::time::Instant;

/// What the policy decided for a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule another attempt after the delay
    Schedule { delay: Duration },

    /// Finalize the link as broken
    GiveUp,
}

/// Policy for HTTP 429 responses
///
/// A parseable `retry-after` header is honored when `retry` is set, with
/// a floor of one second and no attempt budget. Without the header the
/// `retry_no_header` policy applies its fixed delay up to
/// `retry_no_header_count` attempts (-1 means unbounded).
pub fn decide_http_429(
    options: &CheckOptions,
    attempt: u32,
    retry_after: Option<u64>,
) -> RetryDecision {
    match retry_after {
        Some(seconds) if options.retry => RetryDecision::Schedule {
            delay: Duration::from_secs(seconds.max(1)),
        },
        None if options.retry_no_header
            && within_budget(options.retry_no_header_count, attempt) =>
        {
            RetryDecision::Schedule {
                delay: Duration::from_millis(options.retry_no_header_delay),
            }
        }
        _ => RetryDecision::GiveUp,
    }
}

/// Policy for 5xx responses and transport errors
pub fn decide_error(options: &CheckOptions, attempt: u32) -> RetryDecision {
    if options.retry_errors && attempt < options.retry_errors_count {
        RetryDecision::Schedule {
            delay: backoff_delay(attempt, options.retry_errors_jitter),
        }
    } else {
        RetryDecision::GiveUp
    }
}

fn within_budget(count: i64, attempt: u32) -> bool {
    count == -1 || i64::from(attempt) < count
}

/// `2^attempt * 1000` ms plus uniform jitter in `[0, jitter_ms)`
fn backoff_delay(attempt: u32, jitter_ms: u64) -> Duration {
    let base = 1000u64.saturating_mul(1u64 << attempt.min(20));
    let jitter = if jitter_ms > 0 {
        rand::thread_rng().gen_range(0..jitter_ms)
    } else {
        0
    };
    Duration::from_millis(base.saturating_add(jitter))
}

/// A crawl item waiting for its retry time
struct Scheduled {
    due_at: Instant,
    seq: u64,
    item: CrawlItem,
}

// BinaryHeap is a max-heap; reverse the comparison so the earliest due
// time pops first, with insertion order as the tie-break.
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_at
            .cmp(&self.due_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due_at == other.due_at && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

/// Time-ordered queue of URLs awaiting retry
///
/// The dispatcher treats this as an additional work source: an entry
/// becomes dispatchable once `now >= due_at`.
pub struct RetryQueue {
    heap: BinaryHeap<Scheduled>,
    seq: u64,
}

impl RetryQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    /// Schedules an item `delay` from now and returns its due time
    pub fn schedule(&mut self, item: CrawlItem, delay: Duration) -> Instant {
        let due_at = Instant::now() + delay;
        self.heap.push(Scheduled {
            due_at,
            seq: self.seq,
            item,
        });
        self.seq += 1;
        due_at
    }

    /// The earliest due time, if any entry is waiting
    pub fn next_due_at(&self) -> Option<Instant> {
        self.heap.peek().map(|s| s.due_at)
    }

    /// Pops one entry whose due time has passed
    pub fn pop_due(&mut self, now: Instant) -> Option<CrawlItem> {
        if self.heap.peek().is_some_and(|s| s.due_at <= now) {
            self.heap.pop().map(|s| s.item)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl Default for RetryQueue {
    fn default() -> Self {
        Self::new()
    }
}
