//! Bounded admission queue for review jobs
//!
//! The AI endpoint is rate limited, so at most `max_concurrent` reviews
//! may be in flight at once. Excess demand waits in FIFO order. When a
//! slot frees while someone is waiting, ownership of the slot transfers
//! directly to the head waiter; the active count is never decremented in
//! between, so a third party cannot steal the freed slot.

use super::MetricsRecorder;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

/// Observable queue state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub active_jobs: usize,
    pub waiting_jobs: usize,
}

struct QueueState {
    active: usize,
    waiters: VecDeque<oneshot::Sender<()>>,
}

/// Fixed-capacity admission gate over the AI endpoint
pub struct ReviewQueue {
    max_concurrent: usize,
    state: Mutex<QueueState>,
    metrics: Arc<MetricsRecorder>,
}

impl ReviewQueue {
    pub fn new(max_concurrent: usize, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            max_concurrent,
            state: Mutex::new(QueueState {
                active: 0,
                waiters: VecDeque::new(),
            }),
            metrics,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Wait for a review slot.
    ///
    /// Admits immediately while under capacity; otherwise joins the FIFO
    /// wait list. The guard is released before awaiting.
    pub async fn acquire(&self) {
        let waiter = {
            let mut state = self.lock();
            if state.active < self.max_concurrent {
                state.active += 1;
                self.metrics.set_queue_depth(state.waiters.len());
                None
            } else {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                self.metrics.set_queue_depth(state.waiters.len());
                Some(rx)
            }
        };

        if let Some(rx) = waiter {
            // Slot ownership arrives through the channel. The sender only
            // drops if the queue itself is torn down.
            let _ = rx.await;
        }
    }

    /// Return a review slot.
    ///
    /// If anyone is waiting, the slot is handed to the head waiter with
    /// the active count unchanged; otherwise the count drops.
    pub fn release(&self) {
        let mut state = self.lock();
        loop {
            match state.waiters.pop_front() {
                Some(tx) => {
                    if tx.send(()).is_ok() {
                        break;
                    }
                    // Waiter gave up; try the next one
                }
                None => {
                    state.active = state.active.saturating_sub(1);
                    break;
                }
            }
        }
        self.metrics.set_queue_depth(state.waiters.len());
    }

    /// Current admission state
    pub fn stats(&self) -> QueueStats {
        let state = self.lock();
        QueueStats {
            active_jobs: state.active,
            waiting_jobs: state.waiters.len(),
        }
    }

    /// Fire-and-forget: run `job` once a slot is available.
    ///
    /// Returns immediately. Errors inside the job are logged, never
    /// propagated to the caller, so one failing review cannot block the
    /// admission path for others beyond its own slot. The slot is
    /// returned through a drop guard, so even a panicking job cannot
    /// leak it.
    pub fn enqueue_review<F>(self: &Arc<Self>, job: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            queue.acquire().await;
            let _slot = SlotGuard(Arc::clone(&queue));
            if let Err(e) = job.await {
                tracing::error!("review job failed: {e:#}");
            }
        });
    }
}

/// Releases the held slot on drop, unwinding included
struct SlotGuard(Arc<ReviewQueue>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn queue(cap: usize) -> Arc<ReviewQueue> {
        Arc::new(ReviewQueue::new(cap, Arc::new(MetricsRecorder::new())))
    }

    async fn settle<F: Fn() -> bool>(cond: F) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("condition never settled");
    }

    #[tokio::test]
    async fn test_admits_up_to_capacity() {
        let q = queue(5);
        for _ in 0..5 {
            q.acquire().await;
        }
        assert_eq!(
            q.stats(),
            QueueStats {
                active_jobs: 5,
                waiting_jobs: 0
            }
        );
    }

    #[tokio::test]
    async fn test_sixth_waits_until_release() {
        let q = queue(5);
        for _ in 0..5 {
            q.acquire().await;
        }

        let q2 = Arc::clone(&q);
        let waiter = tokio::spawn(async move { q2.acquire().await });

        settle(|| q.stats().waiting_jobs == 1).await;
        assert_eq!(q.stats().active_jobs, 5);

        q.release();
        waiter.await.unwrap();

        // Slot was handed off, not returned to the pool
        assert_eq!(
            q.stats(),
            QueueStats {
                active_jobs: 5,
                waiting_jobs: 0
            }
        );
    }

    #[tokio::test]
    async fn test_release_without_waiters_decrements() {
        let q = queue(2);
        q.acquire().await;
        q.acquire().await;
        q.release();
        assert_eq!(q.stats().active_jobs, 1);
        q.release();
        assert_eq!(q.stats().active_jobs, 0);
    }

    #[tokio::test]
    async fn test_waiters_served_in_fifo_order() {
        let q = queue(1);
        q.acquire().await;

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for i in 0..3 {
            let q2 = Arc::clone(&q);
            let order2 = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                q2.acquire().await;
                order2.lock().unwrap().push(i);
                q2.release();
            }));
            // Make arrival order deterministic
            settle(|| q.stats().waiting_jobs == i + 1).await;
        }

        q.release();
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_enqueue_is_fire_and_forget() {
        let q = queue(5);
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let ran2 = Arc::clone(&ran);
            q.enqueue_review(async move {
                ran2.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        // A failing job is swallowed, not propagated
        q.enqueue_review(async move { anyhow::bail!("boom") });

        settle(|| ran.load(Ordering::SeqCst) == 3).await;
        settle(|| q.stats().active_jobs == 0).await;
    }

    #[tokio::test]
    async fn test_panicking_job_returns_its_slot() {
        let q = queue(1);

        q.enqueue_review(async {
            if true {
                panic!("reviewer blew up");
            }
            Ok(())
        });
        settle(|| q.stats().active_jobs == 0).await;

        // The queue still admits work afterwards
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = Arc::clone(&ran);
        q.enqueue_review(async move {
            ran2.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        settle(|| ran.load(Ordering::SeqCst) == 1).await;
    }
}
