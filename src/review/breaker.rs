//! Circuit breaker for the AI endpoint
//!
//! A degraded endpoint would otherwise eat every concurrency slot with
//! doomed calls. After enough consecutive failures the breaker opens for
//! a cooldown window; reviews started during the window fail fast without
//! touching the endpoint. Breaker state is global to the process, not
//! per guild.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Default)]
struct BreakerState {
    consecutive_failures: u32,
    open_until: Option<Instant>,
}

/// Consecutive-failure circuit breaker
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            state: Mutex::new(BreakerState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a failed AI call. Opens the breaker at the threshold.
    ///
    /// The counter is not cleared when the breaker opens: only a
    /// successful call closes the loop, so a failure right after cooldown
    /// re-opens immediately.
    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.consecutive_failures += 1;

        if state.consecutive_failures >= self.threshold {
            let until = Instant::now() + self.cooldown;
            state.open_until = Some(until);
            tracing::warn!(
                failures = state.consecutive_failures,
                cooldown_secs = self.cooldown.as_secs(),
                "circuit breaker open"
            );
        }
    }

    /// Record a successful AI call, resetting the failure count
    pub fn record_success(&self) {
        let mut state = self.lock();
        state.consecutive_failures = 0;
    }

    /// Whether calls should currently fail fast
    pub fn is_open(&self) -> bool {
        let state = self.lock();
        match state.open_until {
            Some(until) => until > Instant::now(),
            None => false,
        }
    }

    /// Current consecutive failure count
    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// When the breaker closes again, if it is open
    pub fn open_until(&self) -> Option<Instant> {
        self.lock().open_until
    }
}
