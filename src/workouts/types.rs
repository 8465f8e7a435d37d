//! Workout record as supplied by the workout ledger.
//!
//! Workouts are immutable once recorded; the only mutation the ledger allows
//! is the soft-delete flag.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// Kind of exercise session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    Running,
    Cycling,
    Swimming,
    Walking,
    Hiking,
    Rowing,
    Strength,
    Yoga,
    Other,
}

impl WorkoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Running => "running",
            WorkoutType::Cycling => "cycling",
            WorkoutType::Swimming => "swimming",
            WorkoutType::Walking => "walking",
            WorkoutType::Hiking => "hiking",
            WorkoutType::Rowing => "rowing",
            WorkoutType::Strength => "strength",
            WorkoutType::Yoga => "yoga",
            WorkoutType::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "running" => Some(WorkoutType::Running),
            "cycling" => Some(WorkoutType::Cycling),
            "swimming" => Some(WorkoutType::Swimming),
            "walking" => Some(WorkoutType::Walking),
            "hiking" => Some(WorkoutType::Hiking),
            "rowing" => Some(WorkoutType::Rowing),
            "strength" => Some(WorkoutType::Strength),
            "yoga" => Some(WorkoutType::Yoga),
            "other" => Some(WorkoutType::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded exercise session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub workout_type: WorkoutType,
    pub start_time: DateTime<Utc>,
    /// Session length in minutes (required)
    pub duration_minutes: Option<f64>,
    /// Distance covered in kilometers (required, zero for stationary sessions)
    pub distance_km: Option<f64>,
    /// Average pace in minutes per kilometer
    pub pace_min_per_km: Option<f64>,
    /// Average heart rate in bpm
    pub heart_rate_bpm: Option<u16>,
    #[serde(default)]
    pub deleted: bool,
}

impl Workout {
    /// Create a workout with the required numeric fields filled in.
    pub fn new(
        user_id: Uuid,
        workout_type: WorkoutType,
        start_time: DateTime<Utc>,
        duration_minutes: f64,
        distance_km: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            workout_type,
            start_time,
            duration_minutes: Some(duration_minutes),
            distance_km: Some(distance_km),
            pace_min_per_km: None,
            heart_rate_bpm: None,
            deleted: false,
        }
    }

    /// Set the recorded pace.
    pub fn with_pace(mut self, pace_min_per_km: f64) -> Self {
        self.pace_min_per_km = Some(pace_min_per_km);
        self
    }

    /// Set the average heart rate.
    pub fn with_heart_rate(mut self, bpm: u16) -> Self {
        self.heart_rate_bpm = Some(bpm);
        self
    }

    /// Check that every numeric field the engine relies on is present and sane.
    pub fn validate(&self) -> EngineResult<()> {
        match self.duration_minutes {
            None => {
                return Err(EngineError::Validation(format!(
                    "workout {} is missing duration_minutes",
                    self.id
                )))
            }
            Some(d) if !d.is_finite() || d <= 0.0 => {
                return Err(EngineError::Validation(format!(
                    "workout {} has invalid duration_minutes {}",
                    self.id, d
                )))
            }
            Some(_) => {}
        }

        match self.distance_km {
            None => {
                return Err(EngineError::Validation(format!(
                    "workout {} is missing distance_km",
                    self.id
                )))
            }
            Some(d) if !d.is_finite() || d < 0.0 => {
                return Err(EngineError::Validation(format!(
                    "workout {} has invalid distance_km {}",
                    self.id, d
                )))
            }
            Some(_) => {}
        }

        if let Some(p) = self.pace_min_per_km {
            if !p.is_finite() || p <= 0.0 {
                return Err(EngineError::Validation(format!(
                    "workout {} has invalid pace {}",
                    self.id, p
                )));
            }
        }

        Ok(())
    }

    /// Duration in minutes, zero when absent.
    pub fn duration(&self) -> f64 {
        self.duration_minutes.unwrap_or(0.0)
    }

    /// Distance in kilometers, zero when absent.
    pub fn distance(&self) -> f64 {
        self.distance_km.unwrap_or(0.0)
    }

    /// Recorded pace, or pace derived from duration and distance.
    pub fn effective_pace(&self) -> Option<f64> {
        if let Some(p) = self.pace_min_per_km {
            return Some(p);
        }
        match (self.duration_minutes, self.distance_km) {
            (Some(duration), Some(distance)) if distance > 0.0 => Some(duration / distance),
            _ => None,
        }
    }

    /// Calendar date of the session start.
    pub fn date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }
}
