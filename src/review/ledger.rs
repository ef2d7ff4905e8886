//! Gamification ledger
//!
//! Points and streak accounting keyed by (user, guild). Every mutation
//! runs inside a single database transaction: the submission row and the
//! stats row are read-modified-written together, so a crash mid-update
//! cannot credit points without the streak (or the reverse).

use super::UserStats;
use crate::storage::{lock_db, SharedDatabase};
use anyhow::Result;

/// Maximum points deducted for a failed-out challenge
pub const PENALTY_CAP: i64 = 20;

/// Points earned for solving on a given attempt
pub fn points_for_attempt(attempt_number: u32) -> i64 {
    match attempt_number {
        1 => 100,
        2 => 60,
        _ => 30,
    }
}

/// Transactional points/streak accounting
pub struct Ledger {
    db: SharedDatabase,
}

impl Ledger {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Credit a correct solve.
    ///
    /// Writes the award onto the submission row, lazily creates the stats
    /// row on a first solve, and advances the streak and its high-water
    /// mark. Returns the resulting totals.
    pub fn award_points(
        &self,
        user_id: &str,
        guild_id: &str,
        submission_id: i64,
        attempt_number: u32,
    ) -> Result<UserStats> {
        let points = points_for_attempt(attempt_number);
        let mut db = lock_db(&self.db);
        let stats = db.apply_award(user_id, guild_id, submission_id, points)?;

        tracing::info!(
            user = user_id,
            guild = guild_id,
            points,
            streak = stats.current_streak,
            "awarded points"
        );

        Ok(stats)
    }

    /// Deduct for failing out of a challenge (3rd attempt, never solved).
    ///
    /// Deducts at most [`PENALTY_CAP`], never below zero, and resets the
    /// streak. A user with no stats row is untouched.
    pub fn apply_failure_penalty(
        &self,
        user_id: &str,
        guild_id: &str,
    ) -> Result<Option<UserStats>> {
        let mut db = lock_db(&self.db);
        let stats = db.apply_penalty(user_id, guild_id, PENALTY_CAP)?;

        if let Some(ref stats) = stats {
            tracing::info!(
                user = user_id,
                guild = guild_id,
                total = stats.total_points,
                "applied failure penalty"
            );
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Database, NewSubmission};

    fn submission(user: &str, thread: &str, attempt: u32) -> NewSubmission {
        NewSubmission {
            guild_id: "g1".to_string(),
            thread_id: thread.to_string(),
            message_id: format!("m{attempt}"),
            user_id: user.to_string(),
            challenge_id: "b1".to_string(),
            attempt_number: attempt,
            code: "x".to_string(),
            language: "Unknown".to_string(),
            code_hash: "h".to_string(),
        }
    }

    #[test]
    fn test_points_table() {
        assert_eq!(points_for_attempt(1), 100);
        assert_eq!(points_for_attempt(2), 60);
        assert_eq!(points_for_attempt(3), 30);
        // Anything unrecognized falls back to the minimum award
        assert_eq!(points_for_attempt(0), 30);
        assert_eq!(points_for_attempt(7), 30);
    }

    #[test]
    fn test_award_then_penalty_round_trip() {
        let db = Database::open_in_memory().unwrap().into_shared();
        let ledger = Ledger::new(db.clone());

        let id = lock_db(&db)
            .create_submission(&submission("u1", "t1", 2))
            .unwrap();

        let stats = ledger.award_points("u1", "g1", id, 2).unwrap();
        assert_eq!(stats.total_points, 60);
        assert_eq!(stats.current_streak, 1);

        let stats = ledger.apply_failure_penalty("u1", "g1").unwrap().unwrap();
        assert_eq!(stats.total_points, 40);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.best_streak, 1);
    }

    #[test]
    fn test_penalty_never_negative() {
        let db = Database::open_in_memory().unwrap().into_shared();
        let ledger = Ledger::new(db.clone());

        let id = lock_db(&db)
            .create_submission(&submission("u1", "t1", 3))
            .unwrap();
        ledger.award_points("u1", "g1", id, 3).unwrap();

        // 30 points; two penalties floor at zero
        let stats = ledger.apply_failure_penalty("u1", "g1").unwrap().unwrap();
        assert_eq!(stats.total_points, 10);
        let stats = ledger.apply_failure_penalty("u1", "g1").unwrap().unwrap();
        assert_eq!(stats.total_points, 0);
    }

    #[test]
    fn test_penalty_without_stats_is_noop() {
        let db = Database::open_in_memory().unwrap().into_shared();
        let ledger = Ledger::new(db);
        assert!(ledger.apply_failure_penalty("u9", "g1").unwrap().is_none());
    }
}
