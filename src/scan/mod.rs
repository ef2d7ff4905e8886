//! Startup recovery scan
//!
//! A crash can strand submissions in two ways: rows stuck in Reviewing
//! whose worker died, and rows still Pending whose queued job never ran.
//! The scanner first reclaims stale Reviewing rows, then walks every
//! Pending row, re-validates it against the live platform, and re-enqueues
//! the survivors. A row that fails validation is skipped and logged, never
//! deleted; the next scan gets another look at it.

use crate::catalog::ChallengeCatalog;
use crate::extract::extract_code;
use crate::gateway::GatewayClient;
use crate::review::{ReviewJob, ReviewQueue, Reviewer, Submission};
use crate::storage::{lock_db, SharedDatabase};
use anyhow::Result;
use chrono::Duration;
use std::sync::Arc;

/// Outcome counts from one recovery scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Reviewing rows reset back to Pending
    pub reclaimed: usize,
    /// Pending rows re-enqueued for review
    pub enqueued: usize,
    /// Pending rows left alone (guild gone, thread gone or renamed,
    /// message deleted, or a gateway error)
    pub skipped: usize,
}

/// Walks the database at startup and re-enqueues recoverable work
pub struct Scanner {
    db: SharedDatabase,
    catalog: Arc<ChallengeCatalog>,
    queue: Arc<ReviewQueue>,
    reviewer: Arc<Reviewer>,
    stale_after: Duration,
}

impl Scanner {
    pub fn new(
        db: SharedDatabase,
        catalog: Arc<ChallengeCatalog>,
        queue: Arc<ReviewQueue>,
        reviewer: Arc<Reviewer>,
        stale_after: Duration,
    ) -> Self {
        Self {
            db,
            catalog,
            queue,
            reviewer,
            stale_after,
        }
    }

    /// Run one full recovery pass.
    ///
    /// Per-row validation failures are counted as skips, not errors; only
    /// a database failure aborts the scan.
    pub async fn scan_missed(&self, gateway: &dyn GatewayClient) -> Result<ScanReport> {
        let mut report = ScanReport::default();

        let pending = {
            let db = lock_db(&self.db);
            report.reclaimed = db.reset_stale_reviewing(self.stale_after)?;
            db.pending_submissions()?
        };

        if report.reclaimed > 0 {
            tracing::info!(count = report.reclaimed, "reclaimed stale reviewing rows");
        }

        for row in pending {
            match self.recover_row(gateway, &row).await {
                Ok(Some(job)) => {
                    self.enqueue(job);
                    report.enqueued += 1;
                }
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!(
                        submission = row.id,
                        "gateway error while validating, skipping: {e:#}"
                    );
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            reclaimed = report.reclaimed,
            enqueued = report.enqueued,
            skipped = report.skipped,
            "recovery scan complete"
        );

        Ok(report)
    }

    /// Re-validate a Pending row against the live platform and rebuild
    /// its review job from the current message content.
    ///
    /// The code is re-extracted from the live message rather than taken
    /// from the stored snippet, so an edited message is reviewed as it
    /// reads now. The stored attempt number is kept as-is: recounting
    /// rows here would double-count the row being recovered and shift
    /// the award tier. `None` means the row was skipped.
    async fn recover_row(
        &self,
        gateway: &dyn GatewayClient,
        row: &Submission,
    ) -> Result<Option<ReviewJob>> {
        if !gateway.guild_exists(&row.guild_id).await? {
            tracing::debug!(submission = row.id, guild = %row.guild_id, "guild gone, skipping");
            return Ok(None);
        }

        let Some(name) = gateway.thread_name(&row.thread_id).await? else {
            tracing::debug!(submission = row.id, thread = %row.thread_id, "thread gone, skipping");
            return Ok(None);
        };

        // A renamed thread may now point at a different challenge; the
        // stored row must still agree with the live name.
        match self.catalog.match_thread_name(&name) {
            Some(challenge) if challenge.id == row.challenge_id => {}
            _ => {
                tracing::debug!(
                    submission = row.id,
                    thread_name = %name,
                    "thread no longer matches challenge, skipping"
                );
                return Ok(None);
            }
        }

        let Some(message) = gateway
            .fetch_message(&row.thread_id, &row.message_id)
            .await?
        else {
            tracing::debug!(submission = row.id, "message deleted, skipping");
            return Ok(None);
        };

        let Some(extracted) = extract_code(&message.content) else {
            tracing::debug!(submission = row.id, "message no longer contains code, skipping");
            return Ok(None);
        };

        Ok(Some(ReviewJob {
            submission_id: row.id,
            guild_id: row.guild_id.clone(),
            thread_id: row.thread_id.clone(),
            user_id: row.user_id.clone(),
            challenge_id: row.challenge_id.clone(),
            attempt_number: row.attempt_number,
            code: extracted.code,
            language: extracted.language,
        }))
    }

    fn enqueue(&self, job: ReviewJob) {
        let reviewer = Arc::clone(&self.reviewer);
        self.queue
            .enqueue_review(async move { reviewer.process(job).await });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use crate::llm::MockLlmClient;
    use crate::review::{CircuitBreaker, MetricsRecorder, ReviewState};
    use crate::storage::{Database, NewSubmission};
    use std::time::Duration as StdDuration;

    fn scanner(db: &SharedDatabase) -> Scanner {
        let catalog = Arc::new(ChallengeCatalog::load());
        let metrics = Arc::new(MetricsRecorder::new());
        let queue = Arc::new(ReviewQueue::new(5, Arc::clone(&metrics)));
        let reviewer = Arc::new(Reviewer::new(
            Arc::clone(db),
            Arc::clone(&catalog),
            Arc::new(MockLlmClient::new()),
            Arc::new(CircuitBreaker::new(5, StdDuration::from_secs(60))),
            metrics,
        ));
        Scanner::new(
            Arc::clone(db),
            catalog,
            queue,
            reviewer,
            Duration::seconds(30),
        )
    }

    fn insert(db: &SharedDatabase, thread: &str, message: &str, challenge: &str) -> i64 {
        lock_db(db)
            .create_submission(&NewSubmission {
                guild_id: "g1".to_string(),
                thread_id: thread.to_string(),
                message_id: message.to_string(),
                user_id: "u1".to_string(),
                challenge_id: challenge.to_string(),
                attempt_number: 1,
                code: "print(1)".to_string(),
                language: "Python".to_string(),
                code_hash: "h".to_string(),
            })
            .unwrap()
    }

    fn gateway() -> MemoryGateway {
        let mut gw = MemoryGateway::new();
        gw.add_guild("g1");
        gw.add_thread("t1", "[Beginner] FizzBuzz");
        gw.add_message("t1", "m1", "u1", "```python\nprint(1)\n```");
        gw
    }

    async fn settle<F: Fn() -> bool>(cond: F) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(StdDuration::from_millis(1)).await;
        }
        panic!("condition never settled");
    }

    #[tokio::test]
    async fn test_valid_pending_row_is_reviewed() {
        let db = Database::open_in_memory().unwrap().into_shared();
        let id = insert(&db, "t1", "m1", "b2");
        let s = scanner(&db);

        let report = s.scan_missed(&gateway()).await.unwrap();
        assert_eq!(report.enqueued, 1);
        assert_eq!(report.skipped, 0);

        settle(|| {
            lock_db(&db).get_submission(id).unwrap().unwrap().review_state
                == ReviewState::Reviewed
        })
        .await;
    }

    #[tokio::test]
    async fn test_missing_platform_state_skips() {
        let db = Database::open_in_memory().unwrap().into_shared();
        insert(&db, "t1", "gone", "b2"); // message deleted
        insert(&db, "t9", "m1", "b2"); // thread deleted
        let other_guild = lock_db(&db)
            .create_submission(&NewSubmission {
                guild_id: "g9".to_string(),
                thread_id: "t1".to_string(),
                message_id: "m1".to_string(),
                user_id: "u1".to_string(),
                challenge_id: "b2".to_string(),
                attempt_number: 1,
                code: "x".to_string(),
                language: "Unknown".to_string(),
                code_hash: "h".to_string(),
            })
            .unwrap();

        let s = scanner(&db);
        let report = s.scan_missed(&gateway()).await.unwrap();
        assert_eq!(report.enqueued, 0);
        assert_eq!(report.skipped, 3);

        // Skipped rows stay Pending for a later scan
        let row = lock_db(&db).get_submission(other_guild).unwrap().unwrap();
        assert_eq!(row.review_state, ReviewState::Pending);
    }

    #[tokio::test]
    async fn test_recovered_first_attempt_awards_full_points() {
        let db = Database::open_in_memory().unwrap().into_shared();
        let id = insert(&db, "t1", "m1", "b2");
        let s = scanner(&db);

        s.scan_missed(&gateway()).await.unwrap();
        settle(|| {
            lock_db(&db).get_submission(id).unwrap().unwrap().review_state
                == ReviewState::Reviewed
        })
        .await;

        // The row keeps its original attempt number through recovery, so
        // a first attempt still earns the first-attempt award
        let stats = lock_db(&db).get_user_stats("u1", "g1").unwrap().unwrap();
        assert_eq!(stats.total_points, 100);
    }

    #[tokio::test]
    async fn test_message_without_code_skips() {
        let db = Database::open_in_memory().unwrap().into_shared();
        insert(&db, "t1", "m2", "b2");

        let mut gw = gateway();
        gw.add_message("t1", "m2", "u1", "sorry, deleted my code");

        let s = scanner(&db);
        let report = s.scan_missed(&gw).await.unwrap();
        assert_eq!(report.enqueued, 0);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_renamed_thread_mismatch_skips() {
        let db = Database::open_in_memory().unwrap().into_shared();
        // Row recorded against b1, thread now named for FizzBuzz (b2)
        insert(&db, "t1", "m1", "b1");

        let s = scanner(&db);
        let report = s.scan_missed(&gateway()).await.unwrap();
        assert_eq!(report.enqueued, 0);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_stale_reviewing_row_is_reclaimed_and_reviewed() {
        let db = Database::open_in_memory().unwrap().into_shared();
        let id = insert(&db, "t1", "m1", "b2");
        {
            let db = lock_db(&db);
            db.mark_reviewing(id).unwrap();
            db.backdate_review_start(id, Duration::seconds(120)).unwrap();
        }

        let s = scanner(&db);
        let report = s.scan_missed(&gateway()).await.unwrap();
        assert_eq!(report.reclaimed, 1);
        assert_eq!(report.enqueued, 1);

        settle(|| {
            lock_db(&db).get_submission(id).unwrap().unwrap().review_state
                == ReviewState::Reviewed
        })
        .await;
    }

    #[tokio::test]
    async fn test_rescan_after_completion_finds_nothing() {
        let db = Database::open_in_memory().unwrap().into_shared();
        let id = insert(&db, "t1", "m1", "b2");
        let s = scanner(&db);
        let gw = gateway();

        s.scan_missed(&gw).await.unwrap();
        settle(|| {
            lock_db(&db).get_submission(id).unwrap().unwrap().review_state
                == ReviewState::Reviewed
        })
        .await;

        let report = s.scan_missed(&gw).await.unwrap();
        assert_eq!(report, ScanReport::default());
    }
}
