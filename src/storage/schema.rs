//! Database schema definition

/// SQL schema for the CodeDojo database
pub const SCHEMA: &str = r#"
-- One row per challenge submission attempt
CREATE TABLE IF NOT EXISTS submissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    guild_id TEXT NOT NULL,
    thread_id TEXT NOT NULL,
    message_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    challenge_id TEXT NOT NULL,
    attempt_number INTEGER NOT NULL,
    code TEXT NOT NULL,
    language TEXT NOT NULL,
    code_hash TEXT NOT NULL,
    status TEXT,
    ai_confidence REAL,
    ai_explanation TEXT,
    points_awarded INTEGER NOT NULL DEFAULT 0,
    review_state TEXT NOT NULL DEFAULT 'Pending',
    review_started_at TEXT,
    submitted_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_submissions_state ON submissions(review_state);
CREATE INDEX IF NOT EXISTS idx_submissions_thread_user ON submissions(thread_id, user_id);
CREATE INDEX IF NOT EXISTS idx_submissions_challenge ON submissions(guild_id, challenge_id, code_hash);

-- Aggregate gamification stats, one row per (user, guild)
CREATE TABLE IF NOT EXISTS user_stats (
    user_id TEXT NOT NULL,
    guild_id TEXT NOT NULL,
    total_solved INTEGER NOT NULL DEFAULT 0,
    total_points INTEGER NOT NULL DEFAULT 0,
    current_streak INTEGER NOT NULL DEFAULT 0,
    best_streak INTEGER NOT NULL DEFAULT 0,
    last_solved_at TEXT,
    PRIMARY KEY (user_id, guild_id)
);
"#;
