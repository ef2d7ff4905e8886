//! Process-lifetime review metrics
//!
//! Counters cover AI call latency, failure rate, average confidence, and
//! queue depth. A reporter task emits a textual summary every few
//! minutes, but only when the period actually saw a review or an AI call.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Default)]
struct MetricsInner {
    reviews_completed: u64,
    ai_calls: u64,
    ai_failures: u64,
    total_latency: Duration,
    confidence_sum: f64,
    confidence_samples: u64,
    queue_depth: usize,
    active_since_report: bool,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub reviews_completed: u64,
    pub ai_calls: u64,
    pub ai_failures: u64,
    pub avg_latency_ms: f64,
    pub failure_rate: f64,
    pub avg_confidence: f64,
    pub queue_depth: usize,
}

/// Injected recorder shared by the queue and the reviewer
#[derive(Default)]
pub struct MetricsRecorder {
    inner: Mutex<MetricsInner>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MetricsInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record one AI call, successful or not
    pub fn record_ai_call(&self, latency: Duration, success: bool) {
        let mut inner = self.lock();
        inner.ai_calls += 1;
        inner.total_latency += latency;
        if !success {
            inner.ai_failures += 1;
        }
        inner.active_since_report = true;
    }

    /// Record the clamped confidence of a parsed verdict
    pub fn record_confidence(&self, confidence: f64) {
        let mut inner = self.lock();
        inner.confidence_sum += confidence;
        inner.confidence_samples += 1;
    }

    /// Record a review reaching the Reviewed state
    pub fn record_review_completed(&self) {
        let mut inner = self.lock();
        inner.reviews_completed += 1;
        inner.active_since_report = true;
    }

    /// Refresh the queue-depth gauge
    pub fn set_queue_depth(&self, depth: usize) {
        self.lock().queue_depth = depth;
    }

    /// Current counter values
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.lock();
        MetricsSnapshot {
            reviews_completed: inner.reviews_completed,
            ai_calls: inner.ai_calls,
            ai_failures: inner.ai_failures,
            avg_latency_ms: if inner.ai_calls > 0 {
                inner.total_latency.as_millis() as f64 / inner.ai_calls as f64
            } else {
                0.0
            },
            failure_rate: if inner.ai_calls > 0 {
                inner.ai_failures as f64 / inner.ai_calls as f64
            } else {
                0.0
            },
            avg_confidence: if inner.confidence_samples > 0 {
                inner.confidence_sum / inner.confidence_samples as f64
            } else {
                0.0
            },
            queue_depth: inner.queue_depth,
        }
    }

    /// Produce the periodic summary, or `None` when the period was idle.
    ///
    /// Counters are process-lifetime and are not reset; only the activity
    /// flag is.
    pub fn report(&self) -> Option<String> {
        {
            let mut inner = self.lock();
            if !inner.active_since_report {
                return None;
            }
            inner.active_since_report = false;
        }

        let s = self.snapshot();
        Some(format!(
            "review metrics: {} reviews completed, {} AI calls, avg latency {:.0}ms, \
             failure rate {:.1}%, avg confidence {:.2}, queue depth {}",
            s.reviews_completed,
            s.ai_calls,
            s.avg_latency_ms,
            s.failure_rate * 100.0,
            s.avg_confidence,
            s.queue_depth,
        ))
    }

    /// Spawn the periodic reporter task
    pub fn spawn_reporter(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Some(summary) = self.report() {
                    tracing::info!("{}", summary);
                }
            }
        })
    }
}
