//! Fixed-window rate limiting keyed by caller identity and path.
//!
//! # Design Decisions
//! - Entries live in a sharded `DashMap`; the read-modify-write for one key
//!   runs under that key's shard lock, so concurrent callers cannot both
//!   slip past the limit
//! - Denials are not counted
//! - Stale entries are swept at most once per window by whichever caller
//!   wins a CAS on the sweep timestamp; `retain` locks one shard at a time

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Bucket key: one counter per caller and resource path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BucketKey {
    identity: String,
    path: String,
}

/// Request count within the current window.
#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

impl RateLimitEntry {
    fn fresh(now: Instant) -> Self {
        Self {
            count: 1,
            window_start: now,
        }
    }
}

/// Per-identity fixed-window limiter.
#[derive(Debug)]
pub struct RateLimiter {
    entries: DashMap<BucketKey, RateLimitEntry>,
    exempt_paths: HashSet<String>,
    window: Duration,
    max_requests: u32,
    /// Reference point for `last_sweep_ms`.
    epoch: Instant,
    last_sweep_ms: AtomicU64,
}

impl RateLimiter {
    /// `config.max_requests` must be at least 1 (enforced by config validation).
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_epoch(config, Instant::now())
    }

    fn with_epoch(config: &RateLimitConfig, epoch: Instant) -> Self {
        Self {
            entries: DashMap::new(),
            exempt_paths: config.exempt_paths.iter().cloned().collect(),
            window: config.window(),
            max_requests: config.max_requests,
            epoch,
            last_sweep_ms: AtomicU64::new(0),
        }
    }

    /// Decide whether a request from `identity` to `path` is admitted.
    pub fn admit(&self, identity: &str, path: &str) -> bool {
        self.admit_at(identity, path, Instant::now())
    }

    pub(crate) fn admit_at(&self, identity: &str, path: &str, now: Instant) -> bool {
        if self.is_exempt(path) {
            return true;
        }

        self.maybe_sweep(now);

        let key = BucketKey {
            identity: identity.to_string(),
            path: path.to_string(),
        };

        let admitted = match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(RateLimitEntry::fresh(now));
                true
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if now.saturating_duration_since(entry.window_start) >= self.window {
                    *entry = RateLimitEntry::fresh(now);
                    true
                } else if entry.count < self.max_requests {
                    entry.count += 1;
                    true
                } else {
                    false
                }
            }
        };

        if !admitted {
            tracing::warn!(client = %identity, path = %path, "Rate limit exceeded");
            metrics::record_rate_limited(path);
        }
        admitted
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.contains(path)
    }

    /// Window length, also the natural `Retry-After` hint.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of buckets currently tracked.
    pub fn tracked_entries(&self) -> usize {
        self.entries.len()
    }

    /// Drop entries whose window ended more than one grace window ago.
    pub fn sweep(&self, now: Instant) -> usize {
        let horizon = self.window.saturating_mul(2);
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.window_start) < horizon);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.entries.len(), "Swept stale rate limit entries");
        }
        removed
    }

    fn maybe_sweep(&self, now: Instant) {
        let now_ms = now.saturating_duration_since(self.epoch).as_millis() as u64;
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        if now_ms.saturating_sub(last) < self.window.as_millis() as u64 {
            return;
        }
        // Only the caller that wins the CAS sweeps.
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            self.sweep(now);
        }
    }
}
