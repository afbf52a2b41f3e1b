//! Per-source request rate limiting with an injected clock

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Time source for the rate limiter
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Enforces a minimum interval between requests to the same source key
///
/// `reserve` books the next slot and returns how long the caller must wait
/// before sending; concurrent callers for one key are spaced out rather than
/// all released at once.
#[derive(Debug)]
pub struct RateLimiter<C: Clock = SystemClock> {
    clock: C,
    min_interval: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter<SystemClock> {
    pub fn new(min_interval: Duration) -> Self {
        Self::with_clock(min_interval, SystemClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(min_interval: Duration, clock: C) -> Self {
        Self {
            clock,
            min_interval,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Book a request slot for `key`; returns the wait before sending.
    pub fn reserve(&self, key: &str) -> Duration {
        if self.min_interval.is_zero() {
            return Duration::ZERO;
        }

        let now = self.clock.now();
        // A poisoned map only holds timestamps; keep using it
        let mut slots = self
            .next_slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let slot = match slots.get(key) {
            Some(&next) if next > now => next,
            _ => now,
        };
        slots.insert(key.to_string(), slot + self.min_interval);

        slot.saturating_duration_since(now)
    }

    /// Reserve a slot and sleep until it arrives.
    pub async fn wait(&self, key: &str) {
        let delay = self.reserve(key);
        if !delay.is_zero() {
            tracing::debug!(source = %key, "Rate limiting: waiting {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }
}
