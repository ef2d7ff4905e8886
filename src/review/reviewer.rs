//! Reviewer: drives one submission through its review
//!
//! Per submission: mark Reviewing, build the prompt, check the breaker,
//! call the endpoint, parse the verdict, persist the outcome, and trigger
//! the ledger. Any failure lands the row in Failed; the startup scanner
//! owns recovery, there is no in-place retry.

use super::{
    determine_status, CircuitBreaker, Ledger, MAX_ATTEMPTS, MetricsRecorder, SubmissionStatus,
};
use crate::catalog::ChallengeCatalog;
use crate::llm::{clamp_confidence, parse_verdict, Completer, ReviewPrompt, Verdict};
use crate::storage::{lock_db, SharedDatabase};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One admitted review job
#[derive(Debug, Clone)]
pub struct ReviewJob {
    pub submission_id: i64,
    pub guild_id: String,
    pub thread_id: String,
    pub user_id: String,
    pub challenge_id: String,
    pub attempt_number: u32,
    pub code: String,
    pub language: String,
}

/// Orchestrates the review of admitted submissions
pub struct Reviewer {
    db: SharedDatabase,
    catalog: Arc<ChallengeCatalog>,
    llm: Arc<dyn Completer>,
    breaker: Arc<CircuitBreaker>,
    metrics: Arc<MetricsRecorder>,
    ledger: Ledger,
}

impl Reviewer {
    pub fn new(
        db: SharedDatabase,
        catalog: Arc<ChallengeCatalog>,
        llm: Arc<dyn Completer>,
        breaker: Arc<CircuitBreaker>,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        let ledger = Ledger::new(Arc::clone(&db));
        Self {
            db,
            catalog,
            llm,
            breaker,
            metrics,
            ledger,
        }
    }

    /// Process one submission to completion.
    ///
    /// The caller already holds a queue slot. Errors are returned for the
    /// queue wrapper to log; by the time one is returned the row is
    /// already in Failed state.
    pub async fn process(&self, job: ReviewJob) -> Result<()> {
        {
            lock_db(&self.db).mark_reviewing(job.submission_id)?;
        }

        let Some(challenge) = self.catalog.get(&job.challenge_id) else {
            lock_db(&self.db).mark_failed(job.submission_id)?;
            anyhow::bail!(
                "submission {} references unknown challenge {}",
                job.submission_id,
                job.challenge_id
            );
        };

        if self.breaker.is_open() {
            // Fail fast; a synthetic failure keeps the metrics honest
            // about how much work the breaker is shedding.
            lock_db(&self.db).mark_failed(job.submission_id)?;
            self.metrics.record_ai_call(Duration::ZERO, false);
            tracing::warn!(
                submission = job.submission_id,
                "circuit open, review failed fast"
            );
            return Ok(());
        }

        let prompt = ReviewPrompt::generate(challenge, &job.code, &job.language);

        let started = Instant::now();
        let outcome = match self.llm.complete(&prompt).await {
            Ok(response) => match parse_verdict(&response.content) {
                Verdict::Parsed(verdict) => Ok(verdict),
                Verdict::Unparseable { raw } => {
                    Err(anyhow::anyhow!("unparseable model reply: {:.160}", raw))
                }
            },
            Err(e) => Err(e),
        };
        let latency = started.elapsed();

        let verdict = match outcome {
            Ok(verdict) => verdict,
            Err(e) => {
                self.metrics.record_ai_call(latency, false);
                self.breaker.record_failure();
                lock_db(&self.db).mark_failed(job.submission_id)?;
                return Err(e).with_context(|| {
                    format!("review of submission {} failed", job.submission_id)
                });
            }
        };

        self.metrics.record_ai_call(latency, true);
        self.breaker.record_success();

        let confidence = verdict.confidence.map(clamp_confidence);
        let status = determine_status(verdict.is_correct, confidence);
        if let Some(c) = confidence {
            self.metrics.record_confidence(c);
        }

        {
            lock_db(&self.db).finish_review(
                job.submission_id,
                status,
                confidence,
                verdict.explanation.as_deref().unwrap_or(""),
            )?;
        }
        self.metrics.record_review_completed();

        tracing::info!(
            submission = job.submission_id,
            user = %job.user_id,
            status = %status,
            confidence = ?confidence,
            "review complete"
        );

        match status {
            SubmissionStatus::Correct => {
                self.ledger.award_points(
                    &job.user_id,
                    &job.guild_id,
                    job.submission_id,
                    job.attempt_number,
                )?;
            }
            SubmissionStatus::Incorrect => {
                // Failing out: last attempt spent without ever solving it
                let solved = {
                    lock_db(&self.db).has_correct_attempt(&job.user_id, &job.thread_id)?
                };
                if job.attempt_number >= MAX_ATTEMPTS && !solved {
                    self.ledger
                        .apply_failure_penalty(&job.user_id, &job.guild_id)?;
                }
            }
            SubmissionStatus::Partial => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::review::ReviewState;
    use crate::storage::{Database, NewSubmission};

    fn setup(llm: MockLlmClient) -> (SharedDatabase, Reviewer) {
        let db = Database::open_in_memory().unwrap().into_shared();
        let reviewer = Reviewer::new(
            Arc::clone(&db),
            Arc::new(ChallengeCatalog::load()),
            Arc::new(llm),
            Arc::new(CircuitBreaker::new(5, Duration::from_secs(60))),
            Arc::new(MetricsRecorder::new()),
        );
        (db, reviewer)
    }

    fn insert(db: &SharedDatabase, user: &str, thread: &str, attempt: u32) -> i64 {
        lock_db(db)
            .create_submission(&NewSubmission {
                guild_id: "g1".to_string(),
                thread_id: thread.to_string(),
                message_id: format!("m{attempt}"),
                user_id: user.to_string(),
                challenge_id: "b2".to_string(),
                attempt_number: attempt,
                code: "for i in range(100): print(i)".to_string(),
                language: "Python".to_string(),
                code_hash: "h".to_string(),
            })
            .unwrap()
    }

    fn job(id: i64, user: &str, thread: &str, attempt: u32) -> ReviewJob {
        ReviewJob {
            submission_id: id,
            guild_id: "g1".to_string(),
            thread_id: thread.to_string(),
            user_id: user.to_string(),
            challenge_id: "b2".to_string(),
            attempt_number: attempt,
            code: "for i in range(100): print(i)".to_string(),
            language: "Python".to_string(),
        }
    }

    #[tokio::test]
    async fn test_correct_review_awards_points() {
        let mut llm = MockLlmClient::new();
        llm.add_response(
            "FizzBuzz",
            r#"{"is_correct": true, "confidence": 0.9, "explanation": "solid"}"#,
        );
        let (db, reviewer) = setup(llm);

        let id = insert(&db, "u1", "t1", 1);
        reviewer.process(job(id, "u1", "t1", 1)).await.unwrap();

        let row = lock_db(&db).get_submission(id).unwrap().unwrap();
        assert_eq!(row.review_state, ReviewState::Reviewed);
        assert_eq!(row.status, Some(SubmissionStatus::Correct));
        assert_eq!(row.ai_confidence, Some(0.9));
        assert_eq!(row.points_awarded, 100);

        let stats = lock_db(&db).get_user_stats("u1", "g1").unwrap().unwrap();
        assert_eq!(stats.total_points, 100);
        assert_eq!(stats.current_streak, 1);
    }

    #[tokio::test]
    async fn test_low_confidence_is_partial_without_award() {
        let mut llm = MockLlmClient::new();
        llm.add_response(
            "FizzBuzz",
            r#"{"is_correct": true, "confidence": 0.4, "explanation": "maybe"}"#,
        );
        let (db, reviewer) = setup(llm);

        let id = insert(&db, "u1", "t1", 1);
        reviewer.process(job(id, "u1", "t1", 1)).await.unwrap();

        let row = lock_db(&db).get_submission(id).unwrap().unwrap();
        assert_eq!(row.status, Some(SubmissionStatus::Partial));
        assert_eq!(row.points_awarded, 0);
        assert!(lock_db(&db).get_user_stats("u1", "g1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_confidence_is_partial() {
        let mut llm = MockLlmClient::new();
        llm.add_response("FizzBuzz", r#"{"is_correct": true}"#);
        let (db, reviewer) = setup(llm);

        let id = insert(&db, "u1", "t1", 1);
        reviewer.process(job(id, "u1", "t1", 1)).await.unwrap();

        let row = lock_db(&db).get_submission(id).unwrap().unwrap();
        assert_eq!(row.status, Some(SubmissionStatus::Partial));
        assert_eq!(row.ai_confidence, None);
    }

    #[tokio::test]
    async fn test_third_incorrect_attempt_applies_penalty() {
        let mut llm = MockLlmClient::new();
        llm.add_response(
            "FizzBuzz",
            r#"{"is_correct": false, "confidence": 0.95, "explanation": "wrong output"}"#,
        );
        let (db, reviewer) = setup(llm);

        // Prior points to deduct from, earned in a different thread
        let other = insert(&db, "u1", "t0", 1);
        Ledger::new(Arc::clone(&db))
            .award_points("u1", "g1", other, 1)
            .unwrap();

        let id = insert(&db, "u1", "t1", 3);
        reviewer.process(job(id, "u1", "t1", 3)).await.unwrap();

        let stats = lock_db(&db).get_user_stats("u1", "g1").unwrap().unwrap();
        assert_eq!(stats.total_points, 80);
        assert_eq!(stats.current_streak, 0);
    }

    #[tokio::test]
    async fn test_incorrect_before_third_attempt_no_penalty() {
        let mut llm = MockLlmClient::new();
        llm.add_response("FizzBuzz", r#"{"is_correct": false, "confidence": 0.9}"#);
        let (db, reviewer) = setup(llm);

        let other = insert(&db, "u1", "t0", 1);
        Ledger::new(Arc::clone(&db))
            .award_points("u1", "g1", other, 1)
            .unwrap();

        let id = insert(&db, "u1", "t1", 2);
        reviewer.process(job(id, "u1", "t1", 2)).await.unwrap();

        let stats = lock_db(&db).get_user_stats("u1", "g1").unwrap().unwrap();
        assert_eq!(stats.total_points, 100);
    }

    #[tokio::test]
    async fn test_unparseable_reply_marks_failed() {
        let mut llm = MockLlmClient::new();
        llm.add_response("FizzBuzz", "looks good to me!");
        let (db, reviewer) = setup(llm);

        let id = insert(&db, "u1", "t1", 1);
        let err = reviewer.process(job(id, "u1", "t1", 1)).await;
        assert!(err.is_err());

        let row = lock_db(&db).get_submission(id).unwrap().unwrap();
        assert_eq!(row.review_state, ReviewState::Failed);
        assert_eq!(row.status, None);
    }

    #[tokio::test]
    async fn test_endpoint_error_marks_failed_and_trips_breaker() {
        let (db, reviewer) = setup(MockLlmClient::failing("connection refused"));

        let id = insert(&db, "u1", "t1", 1);
        assert!(reviewer.process(job(id, "u1", "t1", 1)).await.is_err());

        let row = lock_db(&db).get_submission(id).unwrap().unwrap();
        assert_eq!(row.review_state, ReviewState::Failed);
        assert_eq!(reviewer.breaker.consecutive_failures(), 1);
    }

    #[tokio::test]
    async fn test_open_breaker_fails_fast() {
        let mut llm = MockLlmClient::new();
        // A reply that would review as correct, to prove it is never used
        llm.add_response("FizzBuzz", r#"{"is_correct": true, "confidence": 1.0}"#);
        let (db, reviewer) = setup(llm);

        for _ in 0..5 {
            reviewer.breaker.record_failure();
        }

        let id = insert(&db, "u1", "t1", 1);
        reviewer.process(job(id, "u1", "t1", 1)).await.unwrap();

        let row = lock_db(&db).get_submission(id).unwrap().unwrap();
        assert_eq!(row.review_state, ReviewState::Failed);
        assert_eq!(row.status, None);
        assert_eq!(reviewer.metrics.snapshot().ai_failures, 1);
    }
}
