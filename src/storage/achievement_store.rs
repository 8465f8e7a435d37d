//! Persistence for unlocked achievements and processed workout events.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::achievements::{Achievement, AchievementKind, CelebrationTier};
use crate::storage::database::{format_timestamp, parse_timestamp, parse_uuid, DatabaseError};

/// Achievement store.
pub struct AchievementStore<'a> {
    conn: &'a Connection,
}

impl<'a> AchievementStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Persist an achievement.
    ///
    /// Returns false when the user already holds this (type, milestone).
    pub fn insert_achievement(&self, achievement: &Achievement) -> Result<bool, DatabaseError> {
        let kind_json = serde_json::to_string(&achievement.kind)
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO achievements
                 (id, user_id, dedup_key, kind_json, tier, achieved_at, workout_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    Uuid::new_v4().to_string(),
                    achievement.user_id.to_string(),
                    achievement.dedup_key(),
                    kind_json,
                    achievement.tier.as_str(),
                    format_timestamp(achievement.achieved_at),
                    achievement.workout_id.to_string(),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(inserted > 0)
    }

    /// Dedup keys of everything the user has unlocked.
    pub fn unlocked_keys(&self, user_id: Uuid) -> Result<HashSet<String>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT dedup_key FROM achievements WHERE user_id = ?1")
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string()], |row| row.get::<_, String>(0))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        rows.collect::<Result<HashSet<_>, _>>()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    /// A user's achievements, most recent first.
    pub fn achievements_for_user(&self, user_id: Uuid) -> Result<Vec<Achievement>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT kind_json, tier, achieved_at, workout_id
                 FROM achievements
                 WHERE user_id = ?1
                 ORDER BY achieved_at DESC, dedup_key ASC",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut achievements = Vec::new();
        for row in rows {
            let (kind_json, tier_str, achieved_str, workout_str) =
                row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

            let kind: AchievementKind = serde_json::from_str(&kind_json)
                .map_err(|e| DatabaseError::DeserializationError(e.to_string()))?;
            let tier = CelebrationTier::from_str(&tier_str).ok_or_else(|| {
                DatabaseError::DeserializationError(format!("Unknown tier: {}", tier_str))
            })?;

            achievements.push(Achievement {
                user_id,
                kind,
                tier,
                achieved_at: parse_timestamp(&achieved_str)?,
                workout_id: parse_uuid(&workout_str)?,
            });
        }

        Ok(achievements)
    }

    /// Whether the workout event was already fully processed.
    pub fn is_processed(&self, user_id: Uuid, workout_id: Uuid) -> Result<bool, DatabaseError> {
        self.conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM processed_workouts WHERE user_id = ?1 AND workout_id = ?2)",
                params![user_id.to_string(), workout_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    /// Record the workout event as processed. Returns false on replay.
    pub fn mark_processed(
        &self,
        user_id: Uuid,
        workout_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO processed_workouts (user_id, workout_id, processed_at)
                 VALUES (?1, ?2, ?3)",
                params![
                    user_id.to_string(),
                    workout_id.to_string(),
                    format_timestamp(at)
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(inserted > 0)
    }
}
