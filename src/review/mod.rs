//! The submission review core
//!
//! This module owns the full lifecycle of a challenge submission:
//! - `ReviewService` admits new submissions (attempt cap, plagiarism gate)
//! - `ReviewQueue` bounds how many reviews run against the AI endpoint
//! - `Reviewer` drives one submission through PENDING → REVIEWING →
//!   REVIEWED | FAILED
//! - `CircuitBreaker` fails fast while the endpoint is degraded
//! - `Ledger` keeps the points/streak accounting transactional
//! - `MetricsRecorder` tracks call latency, failure rate, and queue depth

mod breaker;
mod ledger;
mod metrics;
mod queue;
mod reviewer;

pub use breaker::CircuitBreaker;
pub use ledger::{points_for_attempt, Ledger, PENALTY_CAP};
pub use metrics::{MetricsRecorder, MetricsSnapshot};
pub use queue::{QueueStats, ReviewQueue};
pub use reviewer::{ReviewJob, Reviewer};

use crate::catalog::ChallengeCatalog;
use crate::config::ReviewSettings;
use crate::extract::{content_hash, normalize};
use crate::llm::Completer;
use crate::storage::{lock_db, NewSubmission, SharedDatabase};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// How many reviews may hit the AI endpoint at once
pub const MAX_CONCURRENT_REVIEWS: usize = 5;

/// A user gets three attempts per challenge thread, no matter the outcome
pub const MAX_ATTEMPTS: u32 = 3;

/// A correct verdict below this confidence only earns Partial.
/// The boundary is inclusive: exactly 0.6 is Correct.
pub const CORRECT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Consecutive AI failures before the breaker opens
pub const BREAKER_FAILURE_THRESHOLD: u32 = 5;

/// How long the breaker stays open once tripped
pub const BREAKER_COOLDOWN: Duration = Duration::from_secs(60);

/// A Reviewing row older than this is assumed orphaned by a crash
pub const STALE_REVIEW_WINDOW_SECS: i64 = 30;

/// The AI's verdict on a reviewed submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Correct,
    Incorrect,
    Partial,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Correct => "Correct",
            SubmissionStatus::Incorrect => "Incorrect",
            SubmissionStatus::Partial => "Partial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Correct" => Some(SubmissionStatus::Correct),
            "Incorrect" => Some(SubmissionStatus::Incorrect),
            "Partial" => Some(SubmissionStatus::Partial),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a submission.
///
/// Legal transitions: Pending → Reviewing → {Reviewed, Failed}, plus
/// Reviewing → Pending when the scanner reclaims an orphaned row. No
/// other transition exists; users can never reset a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Pending,
    Reviewing,
    Reviewed,
    Failed,
}

impl ReviewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewState::Pending => "Pending",
            ReviewState::Reviewing => "Reviewing",
            ReviewState::Reviewed => "Reviewed",
            ReviewState::Failed => "Failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Reviewing" => ReviewState::Reviewing,
            "Reviewed" => ReviewState::Reviewed,
            "Failed" => ReviewState::Failed,
            _ => ReviewState::Pending,
        }
    }
}

impl std::fmt::Display for ReviewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One attempt by one user at one challenge in one thread
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: i64,
    pub guild_id: String,
    pub thread_id: String,
    pub message_id: String,
    pub user_id: String,
    pub challenge_id: String,
    pub attempt_number: u32,
    pub code: String,
    pub language: String,
    pub code_hash: String,
    pub status: Option<SubmissionStatus>,
    pub ai_confidence: Option<f64>,
    pub ai_explanation: Option<String>,
    pub points_awarded: i64,
    pub review_state: ReviewState,
    pub review_started_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}

/// Aggregate gamification stats for one (user, guild)
#[derive(Debug, Clone)]
pub struct UserStats {
    pub user_id: String,
    pub guild_id: String,
    pub total_solved: i64,
    pub total_points: i64,
    pub current_streak: i64,
    pub best_streak: i64,
    pub last_solved_at: Option<DateTime<Utc>>,
}

/// Decide the review status from the parsed verdict.
///
/// A missing confidence on a correct verdict is treated conservatively as
/// Partial rather than guessing a number for it.
pub fn determine_status(is_correct: bool, confidence: Option<f64>) -> SubmissionStatus {
    if !is_correct {
        return SubmissionStatus::Incorrect;
    }
    match confidence {
        Some(c) if c >= CORRECT_CONFIDENCE_THRESHOLD => SubmissionStatus::Correct,
        _ => SubmissionStatus::Partial,
    }
}

/// A new submission event from the message-ingestion layer
#[derive(Debug, Clone)]
pub struct SubmissionEvent {
    pub guild_id: String,
    pub thread_id: String,
    pub message_id: String,
    pub user_id: String,
    pub challenge_id: String,
    pub code: String,
    pub language: String,
}

/// What happened to a submitted event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A Pending row was created and the review job enqueued
    Enqueued {
        submission_id: i64,
        attempt_number: u32,
    },
    /// The user already used all attempts in this thread
    AttemptLimitReached,
    /// The code duplicates another user's prior submission
    Plagiarized,
}

/// Entry point for live submissions.
///
/// Admission is checked before any row exists: a fourth attempt is
/// refused outright, and a copied submission never reaches the reviewer.
pub struct ReviewService {
    db: SharedDatabase,
    queue: Arc<ReviewQueue>,
    reviewer: Arc<Reviewer>,
}

impl ReviewService {
    pub fn new(db: SharedDatabase, queue: Arc<ReviewQueue>, reviewer: Arc<Reviewer>) -> Self {
        Self {
            db,
            queue,
            reviewer,
        }
    }

    /// Create a Pending submission and enqueue its review.
    ///
    /// Returns immediately; the review itself runs asynchronously once
    /// the queue admits it.
    pub fn submit(&self, event: SubmissionEvent) -> Result<SubmitOutcome> {
        // The stored fingerprint is the hash of the normalized code, so
        // the duplicate check is a single indexed lookup. Code that
        // normalizes to nothing (comments only) never flags.
        let normalized = normalize(&event.code);
        let code_hash = content_hash(&normalized);

        let (submission_id, attempt_number) = {
            let db = lock_db(&self.db);

            let attempts = db.count_attempts(&event.user_id, &event.thread_id)?;
            if attempts >= MAX_ATTEMPTS {
                return Ok(SubmitOutcome::AttemptLimitReached);
            }

            if !normalized.is_empty()
                && db.has_peer_duplicate(
                    &event.guild_id,
                    &event.challenge_id,
                    &event.user_id,
                    &code_hash,
                )?
            {
                tracing::info!(
                    user = %event.user_id,
                    challenge = %event.challenge_id,
                    "rejected copied submission"
                );
                return Ok(SubmitOutcome::Plagiarized);
            }

            let attempt_number = attempts + 1;
            let id = db.create_submission(&NewSubmission {
                guild_id: event.guild_id.clone(),
                thread_id: event.thread_id.clone(),
                message_id: event.message_id.clone(),
                user_id: event.user_id.clone(),
                challenge_id: event.challenge_id.clone(),
                attempt_number,
                code: event.code.clone(),
                language: event.language.clone(),
                code_hash,
            })?;
            (id, attempt_number)
        };

        let job = ReviewJob {
            submission_id,
            guild_id: event.guild_id,
            thread_id: event.thread_id,
            user_id: event.user_id,
            challenge_id: event.challenge_id,
            attempt_number,
            code: event.code,
            language: event.language,
        };

        let reviewer = Arc::clone(&self.reviewer);
        self.queue
            .enqueue_review(async move { reviewer.process(job).await });

        Ok(SubmitOutcome::Enqueued {
            submission_id,
            attempt_number,
        })
    }
}

/// All review components wired together for process startup.
///
/// Each piece is an explicit process-scoped object rather than a global,
/// so tests can build isolated engines per case.
pub struct ReviewEngine {
    pub queue: Arc<ReviewQueue>,
    pub breaker: Arc<CircuitBreaker>,
    pub metrics: Arc<MetricsRecorder>,
    pub reviewer: Arc<Reviewer>,
    pub service: ReviewService,
    metrics_interval: Duration,
}

impl ReviewEngine {
    pub fn new(
        db: SharedDatabase,
        catalog: Arc<ChallengeCatalog>,
        llm: Arc<dyn Completer>,
        settings: &ReviewSettings,
    ) -> Self {
        let metrics = Arc::new(MetricsRecorder::new());
        let breaker = Arc::new(CircuitBreaker::new(
            settings.breaker_threshold,
            Duration::from_secs(settings.breaker_cooldown_secs),
        ));
        let queue = Arc::new(ReviewQueue::new(
            settings.max_concurrent,
            Arc::clone(&metrics),
        ));
        let reviewer = Arc::new(Reviewer::new(
            Arc::clone(&db),
            catalog,
            llm,
            Arc::clone(&breaker),
            Arc::clone(&metrics),
        ));
        let service = ReviewService::new(db, Arc::clone(&queue), Arc::clone(&reviewer));

        Self {
            queue,
            breaker,
            metrics,
            reviewer,
            service,
            metrics_interval: Duration::from_secs(settings.metrics_interval_secs),
        }
    }

    /// Start the periodic metrics summary task
    pub fn spawn_metrics_reporter(&self) -> tokio::task::JoinHandle<()> {
        Arc::clone(&self.metrics).spawn_reporter(self.metrics_interval)
    }
}
