use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// RateLimiter
///
/// Fixed-window request counting per API key. A key's counter resets when
/// its window (configured length, one minute by default) has elapsed since
/// the first request of that window. Counters live only in memory, like
/// everything else here.
pub struct RateLimiter {
    window: Duration,
    counters: RwLock<HashMap<Uuid, WindowCounter>>,
}

#[derive(Clone, Copy)]
struct WindowCounter {
    window_start: Instant,
    count: u32,
}

/// Outcome of a rate-limit check, also surfaced verbatim on GET /limits.
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    pub allowed: bool,
    pub used: u32,
    pub remaining: u32,
}

/// RateLimiterState
///
/// The concrete type used to share the limiter across the application state.
pub type RateLimiterState = Arc<RateLimiter>;

impl RateLimiter {
    pub fn new(window_secs: u64) -> Self {
        Self {
            window: Duration::from_secs(window_secs),
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// check
    ///
    /// Counts one request against `key_id`'s current window. When the quota
    /// is already spent the request is denied and the counter left as-is, so
    /// denied traffic cannot extend the window.
    pub fn check(&self, key_id: Uuid, quota: u32) -> RateDecision {
        let now = Instant::now();
        let mut counters = self.counters.write().expect("rate limiter lock poisoned");
        let counter = counters.entry(key_id).or_insert(WindowCounter {
            window_start: now,
            count: 0,
        });

        if now.duration_since(counter.window_start) >= self.window {
            counter.window_start = now;
            counter.count = 0;
        }

        if counter.count >= quota {
            return RateDecision {
                allowed: false,
                used: counter.count,
                remaining: 0,
            };
        }

        counter.count += 1;
        RateDecision {
            allowed: true,
            used: counter.count,
            remaining: quota - counter.count,
        }
    }

    /// usage
    ///
    /// Read-only view of the current window, for the GET /limits endpoint.
    /// Does not count as a request itself (the extractor already did).
    pub fn usage(&self, key_id: Uuid, quota: u32) -> RateDecision {
        let counters = self.counters.read().expect("rate limiter lock poisoned");
        let used = counters
            .get(&key_id)
            .filter(|c| c.window_start.elapsed() < self.window)
            .map(|c| c.count)
            .unwrap_or(0);
        RateDecision {
            allowed: used < quota,
            used,
            remaining: quota.saturating_sub(used),
        }
    }
}
