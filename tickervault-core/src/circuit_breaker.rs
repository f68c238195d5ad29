//! Circuit breaker for provider bans and rate limits.
//!
//! Repeated failures (or a hard 403) open the breaker; every request is
//! refused until the cooldown expires, at which point it closes again.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct BreakerInner {
    /// When the breaker last opened, if it is currently open.
    opened_at: Option<Instant>,
    consecutive_failures: u32,
}

/// Shared across workers; all methods take `&self`.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                opened_at: None,
                consecutive_failures: 0,
            }),
            cooldown,
            failure_threshold: 3,
        }
    }

    /// Provider default: 30-minute cooldown, opens after 3 consecutive
    /// failures.
    pub fn default_provider() -> Self {
        Self::new(Duration::from_secs(30 * 60))
    }

    /// Whether requests are currently allowed. Closes the breaker as a
    /// side effect once the cooldown has expired.
    pub fn is_allowed(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.opened_at {
            None => true,
            Some(opened) if opened.elapsed() >= self.cooldown => {
                inner.opened_at = None;
                inner.consecutive_failures = 0;
                true
            }
            Some(_) => false,
        }
    }

    /// A successful request resets the failure streak.
    pub fn record_success(&self) {
        self.inner.lock().unwrap().consecutive_failures = 0;
    }

    /// A failed request extends the streak; reaching the threshold opens
    /// the breaker.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= self.failure_threshold {
            inner.opened_at = Some(Instant::now());
        }
    }

    /// Open immediately, bypassing the failure threshold (403 / IP ban).
    pub fn trip(&self) {
        self.inner.lock().unwrap().opened_at = Some(Instant::now());
    }

    /// Remaining cooldown time; zero when closed.
    pub fn remaining_cooldown(&self) -> Duration {
        match self.inner.lock().unwrap().opened_at {
            None => Duration::ZERO,
            Some(opened) => self.cooldown.saturating_sub(opened.elapsed()),
        }
    }
}
