//! Workout ledger read/write path.

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::storage::database::{format_timestamp, parse_timestamp, parse_uuid, DatabaseError};
use crate::workouts::{Workout, WorkoutType};

/// Workout ledger backed by the `workouts` table.
pub struct WorkoutLedger<'a> {
    conn: &'a Connection,
}

impl<'a> WorkoutLedger<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a workout, ignoring an exact replay of the same id.
    pub fn insert_workout(&self, workout: &Workout) -> Result<bool, DatabaseError> {
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO workouts
                 (id, user_id, workout_type, start_time, duration_minutes, distance_km,
                  pace_min_per_km, heart_rate_bpm, deleted)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    workout.id.to_string(),
                    workout.user_id.to_string(),
                    workout.workout_type.as_str(),
                    format_timestamp(workout.start_time),
                    workout.duration_minutes,
                    workout.distance_km,
                    workout.pace_min_per_km,
                    workout.heart_rate_bpm,
                    workout.deleted,
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(inserted > 0)
    }

    /// Get a workout by ID, deleted or not.
    pub fn get_workout(&self, id: Uuid) -> Result<Option<Workout>, DatabaseError> {
        self.conn
            .query_row(
                "SELECT id, user_id, workout_type, start_time, duration_minutes, distance_km,
                        pace_min_per_km, heart_rate_bpm, deleted
                 FROM workouts WHERE id = ?1",
                params![id.to_string()],
                WorkoutRow::from_row,
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
            .map(WorkoutRow::into_workout)
            .transpose()
    }

    /// A user's non-deleted workouts in chronological order.
    pub fn history_for_user(&self, user_id: Uuid) -> Result<Vec<Workout>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, workout_type, start_time, duration_minutes, distance_km,
                        pace_min_per_km, heart_rate_bpm, deleted
                 FROM workouts
                 WHERE user_id = ?1 AND deleted = 0
                 ORDER BY start_time ASC",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string()], WorkoutRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut workouts = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            workouts.push(row.into_workout()?);
        }

        Ok(workouts)
    }

    /// Soft-delete a workout. Returns false if it was missing or already deleted.
    pub fn soft_delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let updated = self
            .conn
            .execute(
                "UPDATE workouts SET deleted = 1 WHERE id = ?1 AND deleted = 0",
                params![id.to_string()],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(updated > 0)
    }
}

/// Intermediate struct for reading workout rows from database.
struct WorkoutRow {
    id: String,
    user_id: String,
    workout_type: String,
    start_time: String,
    duration_minutes: Option<f64>,
    distance_km: Option<f64>,
    pace_min_per_km: Option<f64>,
    heart_rate_bpm: Option<u16>,
    deleted: bool,
}

impl WorkoutRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            workout_type: row.get(2)?,
            start_time: row.get(3)?,
            duration_minutes: row.get(4)?,
            distance_km: row.get(5)?,
            pace_min_per_km: row.get(6)?,
            heart_rate_bpm: row.get(7)?,
            deleted: row.get(8)?,
        })
    }

    fn into_workout(self) -> Result<Workout, DatabaseError> {
        let workout_type = WorkoutType::from_str(&self.workout_type).ok_or_else(|| {
            DatabaseError::DeserializationError(format!(
                "Unknown workout type: {}",
                self.workout_type
            ))
        })?;

        Ok(Workout {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            workout_type,
            start_time: parse_timestamp(&self.start_time)?,
            duration_minutes: self.duration_minutes,
            distance_km: self.distance_km,
            pace_min_per_km: self.pace_min_per_km,
            heart_rate_bpm: self.heart_rate_bpm,
            deleted: self.deleted,
        })
    }
}
