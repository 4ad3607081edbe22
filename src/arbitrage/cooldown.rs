//! Publish-suppression cooldown, plus a supplemental adapter failure backoff.
//!
//! `Cooldown` mirrors `original_source/.../engine/arb_loop.py`'s
//! `_LAST_ALERT` dict and `_alert_key` exactly: one timestamp per route key,
//! suppress republishing until `alert_cooldown_s` has elapsed. It is backed
//! by `dashmap::DashMap` rather than a `HashMap` behind a mutex, following
//! `pool/state.rs`'s `PoolStateManager` in the teacher crate, since the
//! Scanner evaluates many routes concurrently via `JoinSet`.
//!
//! `FailureBackoff` has no counterpart in the Python original — it adapts
//! the teacher's `arbitrage/cooldown.rs` (`RouteCooldown`) escalating
//! backoff so a route whose adapters keep erroring doesn't get re-tried
//! every single scan. The teacher escalates on block height; this engine
//! has no chain-head signal to key off, so it escalates on scan-iteration
//! count instead.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Suppresses re-publishing the same qualifying route before its window
/// elapses. Keyed on [`crate::types::Route::key`].
pub struct Cooldown {
    last_published: DashMap<String, Instant>,
    window: Duration,
}

impl Cooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            last_published: DashMap::new(),
            window,
        }
    }

    /// True if `key` published within the last `window` and should be
    /// suppressed. A zero window disables cooldown entirely.
    pub fn is_suppressed(&self, key: &str) -> bool {
        if self.window.is_zero() {
            return false;
        }
        match self.last_published.get(key) {
            Some(entry) => entry.elapsed() < self.window,
            None => false,
        }
    }

    /// Record that `key` just published, resetting its window.
    pub fn record_publish(&self, key: &str) {
        self.last_published.insert(key.to_string(), Instant::now());
    }

    pub fn active_count(&self) -> usize {
        self.last_published.len()
    }
}

const ESCALATION_FACTOR: u64 = 5;
const DEFAULT_MAX_BACKOFF_ITERATIONS: u64 = 1800;

struct BackoffEntry {
    last_failed_iteration: u64,
    backoff_iterations: u64,
    failure_count: u32,
}

/// Escalating suppression for a route whose legs keep failing to quote.
/// Not required for correctness of the published signal — purely a
/// scan-efficiency guard — so a route under backoff is simply skipped for
/// the duration, with no effect on `Cooldown`.
pub struct FailureBackoff {
    entries: DashMap<String, BackoffEntry>,
    initial_iterations: u64,
    max_iterations: u64,
}

impl FailureBackoff {
    pub fn new(initial_iterations: u64) -> Self {
        Self {
            entries: DashMap::new(),
            initial_iterations,
            max_iterations: DEFAULT_MAX_BACKOFF_ITERATIONS,
        }
    }

    pub fn is_backed_off(&self, key: &str, current_iteration: u64) -> bool {
        if self.initial_iterations == 0 {
            return false;
        }
        match self.entries.get(key) {
            Some(entry) => current_iteration < entry.last_failed_iteration + entry.backoff_iterations,
            None => false,
        }
    }

    pub fn record_failure(&self, key: &str, current_iteration: u64) {
        if self.initial_iterations == 0 {
            return;
        }
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| BackoffEntry {
            last_failed_iteration: current_iteration,
            backoff_iterations: 0,
            failure_count: 0,
        });
        entry.failure_count += 1;
        entry.last_failed_iteration = current_iteration;
        let escalated = self.initial_iterations.saturating_mul(ESCALATION_FACTOR.saturating_pow(entry.failure_count.saturating_sub(1)));
        entry.backoff_iterations = escalated.min(self.max_iterations);
        debug!(key, failures = entry.failure_count, backoff = entry.backoff_iterations, "route backoff escalated");
    }

    pub fn record_success(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn active_count(&self) -> usize {
        self.entries.len()
    }
}
