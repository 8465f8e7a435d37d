//! Database schema definitions for the gamification engine.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Workout ledger mirror (read path for user history)
CREATE TABLE IF NOT EXISTS workouts (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    workout_type TEXT NOT NULL,
    start_time TEXT NOT NULL,
    duration_minutes REAL,
    distance_km REAL,
    pace_min_per_km REAL,
    heart_rate_bpm INTEGER,
    deleted INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_workouts_user_start ON workouts(user_id, start_time);

-- Unlocked achievements; one row per (user, type, milestone)
CREATE TABLE IF NOT EXISTS achievements (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    dedup_key TEXT NOT NULL,
    kind_json TEXT NOT NULL,
    tier TEXT NOT NULL,
    achieved_at TEXT NOT NULL,
    workout_id TEXT NOT NULL,
    UNIQUE(user_id, dedup_key)
);

-- Workout events fully processed by the engine
CREATE TABLE IF NOT EXISTS processed_workouts (
    user_id TEXT NOT NULL,
    workout_id TEXT NOT NULL,
    processed_at TEXT NOT NULL,
    PRIMARY KEY (user_id, workout_id)
);

-- Challenges
CREATE TABLE IF NOT EXISTS challenges (
    id TEXT PRIMARY KEY,
    creator_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    challenge_type_json TEXT NOT NULL,
    target_value REAL NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    privacy TEXT NOT NULL DEFAULT 'public',
    status TEXT NOT NULL DEFAULT 'upcoming',
    created_at TEXT NOT NULL,
    finalized_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_challenges_status ON challenges(status);

-- Challenge participants
CREATE TABLE IF NOT EXISTS participants (
    id TEXT PRIMARY KEY,
    challenge_id TEXT NOT NULL REFERENCES challenges(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    current_progress REAL NOT NULL DEFAULT 0,
    completion_percentage REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'active',
    joined_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    version INTEGER NOT NULL DEFAULT 0,
    last_milestone_notified INTEGER,
    UNIQUE(challenge_id, user_id)
);

CREATE INDEX IF NOT EXISTS idx_participants_user ON participants(user_id);

-- Workouts already counted toward a participant's progress
CREATE TABLE IF NOT EXISTS participant_workouts (
    participant_id TEXT NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
    workout_id TEXT NOT NULL,
    applied_at TEXT NOT NULL,
    PRIMARY KEY (participant_id, workout_id)
);

-- Terminal badges
CREATE TABLE IF NOT EXISTS badge_awards (
    id TEXT PRIMARY KEY,
    challenge_id TEXT NOT NULL REFERENCES challenges(id) ON DELETE CASCADE,
    participant_id TEXT NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    badge TEXT NOT NULL,
    final_rank INTEGER NOT NULL,
    completion_percentage REAL NOT NULL,
    awarded_at TEXT NOT NULL,
    UNIQUE(participant_id, badge)
);
"#;

/// SQL for schema version tracking (migrations)
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;
