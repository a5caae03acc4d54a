//! Sliding-window rate limiter for public write endpoints.
//!
//! Each key keeps the timestamps of its accepted requests inside the current
//! window. A request is accepted while fewer than `capacity` timestamps remain
//! after pruning. Stale keys are swept every [`SWEEP_INTERVAL`] calls.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Number of `allow` calls between full sweeps of idle keys.
pub const SWEEP_INTERVAL: u64 = 1000;

#[derive(Debug, Default)]
struct LimiterState {
    hits: HashMap<String, Vec<Instant>>,
    calls: u64,
}

#[derive(Debug)]
pub struct RateLimiter {
    capacity: usize,
    window: Duration,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self { capacity, window, state: Mutex::new(LimiterState::default()) }
    }

    /// Record a request for `key` now, returning whether it is allowed.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// Same as [`allow`](Self::allow) with an explicit clock reading.
    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        let cutoff = now.checked_sub(self.window);
        let mut state = self.state.lock();

        state.calls += 1;
        if state.calls % SWEEP_INTERVAL == 0 {
            Self::sweep(&mut state.hits, cutoff);
        }

        let hits = state.hits.entry(key.to_string()).or_default();
        if let Some(cutoff) = cutoff {
            hits.retain(|t| *t > cutoff);
        }

        if hits.len() >= self.capacity {
            tracing::debug!(key, hits = hits.len(), "rate limit exceeded");
            return false;
        }

        hits.push(now);
        true
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.state.lock().hits.len()
    }

    fn sweep(hits: &mut HashMap<String, Vec<Instant>>, cutoff: Option<Instant>) {
        let Some(cutoff) = cutoff else { return };
        let before = hits.len();
        hits.retain(|_, times| times.last().is_some_and(|newest| *newest > cutoff));
        let evicted = before - hits.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = hits.len(), "swept idle rate limiter keys");
        }
    }
}
