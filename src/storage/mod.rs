//! SQLite storage layer for CodeDojo
//!
//! This module handles persistent storage of:
//! - Challenge submissions and their review lifecycle state
//! - Per-user gamification stats (points, streaks)
//!
//! The reviewer and the ledger are the only writers of review outcomes;
//! the scanner only resets stale rows back to Pending. Ledger mutations
//! run inside a single transaction so the submission row and the stats
//! row can never diverge.

mod schema;

pub use schema::SCHEMA;

use crate::review::{ReviewState, Submission, SubmissionStatus, UserStats};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Database handle shared across async tasks.
///
/// rusqlite connections are not Sync; every access goes through the
/// mutex, and the guard is never held across an await point.
pub type SharedDatabase = Arc<Mutex<Database>>;

/// Lock the shared handle, recovering from a poisoned mutex.
///
/// A panic in another task while holding the guard poisons the lock;
/// the data itself is still consistent because every write path commits
/// through SQLite, so recovery is safe.
pub fn lock_db(db: &SharedDatabase) -> std::sync::MutexGuard<'_, Database> {
    db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Timestamp format stored in TEXT columns. Fixed precision keeps the
/// strings lexicographically comparable.
fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// A submission about to be inserted, before it has an id
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub guild_id: String,
    pub thread_id: String,
    pub message_id: String,
    pub user_id: String,
    pub challenge_id: String,
    pub attempt_number: u32,
    pub code: String,
    pub language: String,
    pub code_hash: String,
}

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("Failed to open database at {:?}", path.as_ref()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Initialize the database schema
    fn initialize(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Wrap a database in the shared handle used by async components
    pub fn into_shared(self) -> SharedDatabase {
        Arc::new(Mutex::new(self))
    }

    // ==================== Submissions ====================

    /// Insert a new Pending submission, returning its id
    pub fn create_submission(&self, new: &NewSubmission) -> Result<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO submissions (
                    guild_id, thread_id, message_id, user_id, challenge_id,
                    attempt_number, code, language, code_hash,
                    review_state, submitted_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'Pending', ?10)
                "#,
                params![
                    new.guild_id,
                    new.thread_id,
                    new.message_id,
                    new.user_id,
                    new.challenge_id,
                    new.attempt_number as i64,
                    new.code,
                    new.language,
                    new.code_hash,
                    timestamp(Utc::now()),
                ],
            )
            .context("Failed to insert submission")?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Get a submission by id
    pub fn get_submission(&self, id: i64) -> Result<Option<Submission>> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1"),
                params![id],
                map_submission,
            )
            .optional()
            .context("Failed to get submission")?;

        Ok(result)
    }

    /// How many attempts a user has made in a thread
    pub fn count_attempts(&self, user_id: &str, thread_id: &str) -> Result<u32> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM submissions WHERE user_id = ?1 AND thread_id = ?2",
                params![user_id, thread_id],
                |row| row.get(0),
            )
            .context("Failed to count attempts")?;

        Ok(count as u32)
    }

    /// Whether a user already has a Correct outcome in a thread
    pub fn has_correct_attempt(&self, user_id: &str, thread_id: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM submissions
                 WHERE user_id = ?1 AND thread_id = ?2 AND status = 'Correct'",
                params![user_id, thread_id],
                |row| row.get(0),
            )
            .context("Failed to check for correct attempt")?;

        Ok(count > 0)
    }

    /// Whether another user already submitted code with this fingerprint
    /// for the same (guild, challenge).
    ///
    /// `code_hash` is the hash of the normalized code, so equality here is
    /// exact-match-after-normalization without fetching or re-normalizing
    /// any prior submission. A user is never flagged against their own
    /// resubmissions.
    pub fn has_peer_duplicate(
        &self,
        guild_id: &str,
        challenge_id: &str,
        exclude_user: &str,
        code_hash: &str,
    ) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM submissions
                 WHERE guild_id = ?1 AND challenge_id = ?2
                   AND user_id != ?3 AND code_hash = ?4",
                params![guild_id, challenge_id, exclude_user, code_hash],
                |row| row.get(0),
            )
            .context("Failed to check for duplicate code")?;

        Ok(count > 0)
    }

    /// Transition a submission to Reviewing and stamp the start time
    pub fn mark_reviewing(&self, id: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE submissions
                 SET review_state = 'Reviewing', review_started_at = ?1
                 WHERE id = ?2",
                params![timestamp(Utc::now()), id],
            )
            .context("Failed to mark submission reviewing")?;
        Ok(())
    }

    /// Transition a submission to Failed
    pub fn mark_failed(&self, id: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE submissions SET review_state = 'Failed' WHERE id = ?1",
                params![id],
            )
            .context("Failed to mark submission failed")?;
        Ok(())
    }

    /// Persist a completed review outcome
    pub fn finish_review(
        &self,
        id: i64,
        status: SubmissionStatus,
        confidence: Option<f64>,
        explanation: &str,
    ) -> Result<()> {
        self.conn
            .execute(
                "UPDATE submissions
                 SET review_state = 'Reviewed', status = ?1,
                     ai_confidence = ?2, ai_explanation = ?3
                 WHERE id = ?4",
                params![status.as_str(), confidence, explanation, id],
            )
            .context("Failed to persist review outcome")?;
        Ok(())
    }

    /// Reset Reviewing rows whose start stamp is older than the stale
    /// window back to Pending, clearing the stamp. Returns the number of
    /// rows reclaimed.
    pub fn reset_stale_reviewing(&self, stale_after: Duration) -> Result<usize> {
        let cutoff = timestamp(Utc::now() - stale_after);

        let count = self
            .conn
            .execute(
                "UPDATE submissions
                 SET review_state = 'Pending', review_started_at = NULL
                 WHERE review_state = 'Reviewing' AND review_started_at < ?1",
                params![cutoff],
            )
            .context("Failed to reset stale reviewing rows")?;

        Ok(count)
    }

    /// Shift a Reviewing row's start stamp into the past
    #[cfg(test)]
    pub fn backdate_review_start(&self, id: i64, by: Duration) -> Result<()> {
        self.conn.execute(
            "UPDATE submissions SET review_started_at = ?1 WHERE id = ?2",
            params![timestamp(Utc::now() - by), id],
        )?;
        Ok(())
    }

    /// All submissions currently in Pending state, oldest first
    pub fn pending_submissions(&self) -> Result<Vec<Submission>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions
             WHERE review_state = 'Pending'
             ORDER BY submitted_at"
        ))?;

        let rows = stmt.query_map([], map_submission)?;

        let mut submissions = Vec::new();
        for row in rows {
            submissions.push(row?);
        }

        Ok(submissions)
    }

    // ==================== Gamification ledger ====================

    /// Credit points for a correct solve.
    ///
    /// Writes the awarded amount onto the submission row and creates or
    /// updates the (user, guild) stats row, all in one transaction.
    /// Returns the resulting totals.
    pub fn apply_award(
        &mut self,
        user_id: &str,
        guild_id: &str,
        submission_id: i64,
        points: i64,
    ) -> Result<UserStats> {
        let now = timestamp(Utc::now());
        let tx = self
            .conn
            .transaction()
            .context("Failed to start award transaction")?;

        tx.execute(
            "UPDATE submissions SET points_awarded = ?1 WHERE id = ?2",
            params![points, submission_id],
        )?;

        let existing = tx
            .query_row(
                "SELECT total_solved, total_points, current_streak, best_streak
                 FROM user_stats WHERE user_id = ?1 AND guild_id = ?2",
                params![user_id, guild_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        let stats = match existing {
            Some((solved, total, streak, best)) => {
                let new_streak = streak + 1;
                let new_best = best.max(new_streak);
                tx.execute(
                    "UPDATE user_stats
                     SET total_solved = ?1, total_points = ?2,
                         current_streak = ?3, best_streak = ?4, last_solved_at = ?5
                     WHERE user_id = ?6 AND guild_id = ?7",
                    params![
                        solved + 1,
                        total + points,
                        new_streak,
                        new_best,
                        now,
                        user_id,
                        guild_id
                    ],
                )?;
                UserStats {
                    user_id: user_id.to_string(),
                    guild_id: guild_id.to_string(),
                    total_solved: solved + 1,
                    total_points: total + points,
                    current_streak: new_streak,
                    best_streak: new_best,
                    last_solved_at: parse_timestamp(&now),
                }
            }
            None => {
                tx.execute(
                    "INSERT INTO user_stats
                     (user_id, guild_id, total_solved, total_points,
                      current_streak, best_streak, last_solved_at)
                     VALUES (?1, ?2, 1, ?3, 1, 1, ?4)",
                    params![user_id, guild_id, points, now],
                )?;
                UserStats {
                    user_id: user_id.to_string(),
                    guild_id: guild_id.to_string(),
                    total_solved: 1,
                    total_points: points,
                    current_streak: 1,
                    best_streak: 1,
                    last_solved_at: parse_timestamp(&now),
                }
            }
        };

        tx.commit().context("Failed to commit award transaction")?;

        Ok(stats)
    }

    /// Deduct up to `cap` points and reset the streak.
    ///
    /// The deduction never takes the total below zero. Returns `None`
    /// (a no-op) if the user has no stats row yet.
    pub fn apply_penalty(
        &mut self,
        user_id: &str,
        guild_id: &str,
        cap: i64,
    ) -> Result<Option<UserStats>> {
        let tx = self
            .conn
            .transaction()
            .context("Failed to start penalty transaction")?;

        let existing = tx
            .query_row(
                "SELECT total_solved, total_points, best_streak, last_solved_at
                 FROM user_stats WHERE user_id = ?1 AND guild_id = ?2",
                params![user_id, guild_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((solved, total, best, last_solved)) = existing else {
            return Ok(None);
        };

        let deduction = cap.min(total).max(0);
        let new_total = total - deduction;

        tx.execute(
            "UPDATE user_stats
             SET total_points = ?1, current_streak = 0
             WHERE user_id = ?2 AND guild_id = ?3",
            params![new_total, user_id, guild_id],
        )?;

        tx.commit().context("Failed to commit penalty transaction")?;

        Ok(Some(UserStats {
            user_id: user_id.to_string(),
            guild_id: guild_id.to_string(),
            total_solved: solved,
            total_points: new_total,
            current_streak: 0,
            best_streak: best,
            last_solved_at: last_solved.as_deref().and_then(parse_timestamp),
        }))
    }

    /// Get the stats row for a (user, guild), if any
    pub fn get_user_stats(&self, user_id: &str, guild_id: &str) -> Result<Option<UserStats>> {
        let result = self
            .conn
            .query_row(
                "SELECT user_id, guild_id, total_solved, total_points,
                        current_streak, best_streak, last_solved_at
                 FROM user_stats WHERE user_id = ?1 AND guild_id = ?2",
                params![user_id, guild_id],
                |row| {
                    Ok(UserStats {
                        user_id: row.get(0)?,
                        guild_id: row.get(1)?,
                        total_solved: row.get(2)?,
                        total_points: row.get(3)?,
                        current_streak: row.get(4)?,
                        best_streak: row.get(5)?,
                        last_solved_at: row
                            .get::<_, Option<String>>(6)?
                            .as_deref()
                            .and_then(parse_timestamp),
                    })
                },
            )
            .optional()
            .context("Failed to get user stats")?;

        Ok(result)
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let count = |state: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM submissions WHERE review_state = ?1",
                params![state],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        };

        let submissions: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM submissions", [], |row| row.get(0))?;

        let users: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM user_stats", [], |row| row.get(0))?;

        Ok(DatabaseStats {
            submissions: submissions as usize,
            pending: count("Pending")?,
            reviewing: count("Reviewing")?,
            reviewed: count("Reviewed")?,
            failed: count("Failed")?,
            users_tracked: users as usize,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub submissions: usize,
    pub pending: usize,
    pub reviewing: usize,
    pub reviewed: usize,
    pub failed: usize,
    pub users_tracked: usize,
}

const SUBMISSION_COLUMNS: &str = "id, guild_id, thread_id, message_id, user_id, challenge_id, \
     attempt_number, code, language, code_hash, status, ai_confidence, \
     ai_explanation, points_awarded, review_state, review_started_at, submitted_at";

fn map_submission(row: &Row<'_>) -> rusqlite::Result<Submission> {
    Ok(Submission {
        id: row.get(0)?,
        guild_id: row.get(1)?,
        thread_id: row.get(2)?,
        message_id: row.get(3)?,
        user_id: row.get(4)?,
        challenge_id: row.get(5)?,
        attempt_number: row.get::<_, i64>(6)? as u32,
        code: row.get(7)?,
        language: row.get(8)?,
        code_hash: row.get(9)?,
        status: row
            .get::<_, Option<String>>(10)?
            .as_deref()
            .and_then(SubmissionStatus::parse),
        ai_confidence: row.get(11)?,
        ai_explanation: row.get(12)?,
        points_awarded: row.get(13)?,
        review_state: ReviewState::parse(&row.get::<_, String>(14)?),
        review_started_at: row
            .get::<_, Option<String>>(15)?
            .as_deref()
            .and_then(parse_timestamp),
        submitted_at: parse_timestamp(&row.get::<_, String>(16)?).unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(user: &str, thread: &str, attempt: u32) -> NewSubmission {
        NewSubmission {
            guild_id: "g1".to_string(),
            thread_id: thread.to_string(),
            message_id: format!("m-{user}-{attempt}"),
            user_id: user.to_string(),
            challenge_id: "b2".to_string(),
            attempt_number: attempt,
            code: "print(1)".to_string(),
            language: "Python".to_string(),
            code_hash: crate::extract::code_fingerprint("print(1)"),
        }
    }

    #[test]
    fn test_database_creation() {
        let db = Database::open_in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.submissions, 0);
        assert_eq!(stats.users_tracked, 0);
    }

    #[test]
    fn test_submission_lifecycle() {
        let db = Database::open_in_memory().unwrap();

        let id = db.create_submission(&sample("u1", "t1", 1)).unwrap();
        let row = db.get_submission(id).unwrap().unwrap();
        assert_eq!(row.review_state, ReviewState::Pending);
        assert!(row.review_started_at.is_none());
        assert_eq!(row.points_awarded, 0);

        db.mark_reviewing(id).unwrap();
        let row = db.get_submission(id).unwrap().unwrap();
        assert_eq!(row.review_state, ReviewState::Reviewing);
        assert!(row.review_started_at.is_some());

        db.finish_review(id, SubmissionStatus::Correct, Some(0.92), "Looks right")
            .unwrap();
        let row = db.get_submission(id).unwrap().unwrap();
        assert_eq!(row.review_state, ReviewState::Reviewed);
        assert_eq!(row.status, Some(SubmissionStatus::Correct));
        assert_eq!(row.ai_confidence, Some(0.92));
    }

    #[test]
    fn test_count_attempts_scoped_to_thread_and_user() {
        let db = Database::open_in_memory().unwrap();
        db.create_submission(&sample("u1", "t1", 1)).unwrap();
        db.create_submission(&sample("u1", "t1", 2)).unwrap();
        db.create_submission(&sample("u1", "t2", 1)).unwrap();
        db.create_submission(&sample("u2", "t1", 1)).unwrap();

        assert_eq!(db.count_attempts("u1", "t1").unwrap(), 2);
        assert_eq!(db.count_attempts("u1", "t2").unwrap(), 1);
        assert_eq!(db.count_attempts("u2", "t2").unwrap(), 0);
    }

    #[test]
    fn test_stale_reset_only_touches_old_reviewing_rows() {
        let db = Database::open_in_memory().unwrap();
        let stale = db.create_submission(&sample("u1", "t1", 1)).unwrap();
        let fresh = db.create_submission(&sample("u1", "t2", 1)).unwrap();

        db.mark_reviewing(stale).unwrap();
        db.mark_reviewing(fresh).unwrap();

        // Backdate one row past the window
        db.conn
            .execute(
                "UPDATE submissions SET review_started_at = ?1 WHERE id = ?2",
                params![timestamp(Utc::now() - Duration::seconds(120)), stale],
            )
            .unwrap();

        let reset = db.reset_stale_reviewing(Duration::seconds(30)).unwrap();
        assert_eq!(reset, 1);

        let row = db.get_submission(stale).unwrap().unwrap();
        assert_eq!(row.review_state, ReviewState::Pending);
        assert!(row.review_started_at.is_none());

        let row = db.get_submission(fresh).unwrap().unwrap();
        assert_eq!(row.review_state, ReviewState::Reviewing);
    }

    #[test]
    fn test_award_creates_then_updates_stats() {
        let mut db = Database::open_in_memory().unwrap();
        let id = db.create_submission(&sample("u1", "t1", 1)).unwrap();

        let stats = db.apply_award("u1", "g1", id, 100).unwrap();
        assert_eq!(stats.total_solved, 1);
        assert_eq!(stats.total_points, 100);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.best_streak, 1);

        let row = db.get_submission(id).unwrap().unwrap();
        assert_eq!(row.points_awarded, 100);

        let id2 = db.create_submission(&sample("u1", "t2", 1)).unwrap();
        let stats = db.apply_award("u1", "g1", id2, 60).unwrap();
        assert_eq!(stats.total_solved, 2);
        assert_eq!(stats.total_points, 160);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.best_streak, 2);
    }

    #[test]
    fn test_penalty_floors_at_zero_and_resets_streak() {
        let mut db = Database::open_in_memory().unwrap();
        let id = db.create_submission(&sample("u1", "t1", 1)).unwrap();
        db.apply_award("u1", "g1", id, 30).unwrap();

        let stats = db.apply_penalty("u1", "g1", 20).unwrap().unwrap();
        assert_eq!(stats.total_points, 10);
        assert_eq!(stats.current_streak, 0);

        let stats = db.apply_penalty("u1", "g1", 20).unwrap().unwrap();
        assert_eq!(stats.total_points, 0);

        let stats = db.apply_penalty("u1", "g1", 20).unwrap().unwrap();
        assert_eq!(stats.total_points, 0);
    }

    #[test]
    fn test_penalty_without_stats_row_is_noop() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(db.apply_penalty("ghost", "g1", 20).unwrap().is_none());
        assert!(db.get_user_stats("ghost", "g1").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_lookup_by_fingerprint() {
        let db = Database::open_in_memory().unwrap();
        db.create_submission(&sample("u1", "t1", 1)).unwrap();

        let hash = crate::extract::code_fingerprint("print(1)");
        assert!(db.has_peer_duplicate("g1", "b2", "u2", &hash).unwrap());
        // A user's own rows never count as peers
        assert!(!db.has_peer_duplicate("g1", "b2", "u1", &hash).unwrap());
        // Different fingerprint, no match
        let other = crate::extract::code_fingerprint("print(2)");
        assert!(!db.has_peer_duplicate("g1", "b2", "u2", &other).unwrap());
    }
}
