//! Challenge and participant records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::badges::BadgeKind;
use crate::error::{EngineError, EngineResult};
use crate::storage::config::ChallengeSettings;
use crate::workouts::WorkoutType;

/// Quantity a specific-workout-type challenge accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressMetric {
    Distance,
    Duration,
}

/// What a challenge measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChallengeType {
    /// Sum of kilometers
    TotalDistance,
    /// Sum of minutes
    TotalDuration,
    /// Current run of consecutive active days inside the window
    ConsecutiveDays,
    /// Distance or duration of one workout type only
    SpecificWorkoutType {
        workout_type: WorkoutType,
        metric: ProgressMetric,
    },
}

impl ChallengeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::TotalDistance => "total_distance",
            ChallengeType::TotalDuration => "total_duration",
            ChallengeType::ConsecutiveDays => "consecutive_days",
            ChallengeType::SpecificWorkoutType { .. } => "specific_workout_type",
        }
    }

    /// Unit of `target_value` and `current_progress`.
    pub fn unit(&self) -> &'static str {
        match self {
            ChallengeType::TotalDistance => "km",
            ChallengeType::TotalDuration => "minutes",
            ChallengeType::ConsecutiveDays => "days",
            ChallengeType::SpecificWorkoutType { metric, .. } => match metric {
                ProgressMetric::Distance => "km",
                ProgressMetric::Duration => "minutes",
            },
        }
    }

    /// Whether a workout of this type counts toward the challenge.
    pub fn accepts(&self, workout_type: WorkoutType) -> bool {
        match self {
            ChallengeType::SpecificWorkoutType {
                workout_type: wanted,
                ..
            } => *wanted == workout_type,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Public,
    Private,
}

impl Privacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Private => "private",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Privacy::Public),
            "private" => Some(Privacy::Private),
            _ => None,
        }
    }
}

/// Challenge lifecycle. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Upcoming,
    Active,
    Completed,
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::Upcoming => "upcoming",
            ChallengeStatus::Active => "active",
            ChallengeStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "upcoming" => Some(ChallengeStatus::Upcoming),
            "active" => Some(ChallengeStatus::Active),
            "completed" => Some(ChallengeStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-boxed competition against a target metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub challenge_type: ChallengeType,
    pub target_value: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub privacy: Privacy,
    /// Stored status; may lag behind the clock until the sweeper runs
    pub status: ChallengeStatus,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    /// Status implied by the clock, never earlier than the stored status.
    pub fn status_at(&self, now: DateTime<Utc>) -> ChallengeStatus {
        let by_clock = if now >= self.end_date {
            ChallengeStatus::Completed
        } else if now >= self.start_date {
            ChallengeStatus::Active
        } else {
            ChallengeStatus::Upcoming
        };
        by_clock.max(self.status)
    }

    /// Move the stored status forward to match the clock.
    ///
    /// Returns true if the status changed.
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        let next = self.status_at(now);
        let changed = next != self.status;
        self.status = next;
        changed
    }

    /// Whether `at` falls inside [start_date, end_date].
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start_date && at <= self.end_date
    }

    /// Completion percentage for a progress value. Not capped at 100.
    pub fn percentage_of(&self, progress: f64) -> f64 {
        if self.target_value <= 0.0 {
            return 0.0;
        }
        progress / self.target_value * 100.0
    }
}

/// Request to create a challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChallenge {
    pub creator_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub challenge_type: ChallengeType,
    pub target_value: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub privacy: Privacy,
    /// Users invited at creation, not counting the creator
    #[serde(default)]
    pub invitees: Vec<Uuid>,
}

impl NewChallenge {
    /// Check the creation constraints.
    pub fn validate(&self, settings: &ChallengeSettings) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::Validation("challenge name is empty".to_string()));
        }

        if !self.target_value.is_finite() || self.target_value <= 0.0 {
            return Err(EngineError::Validation(format!(
                "invalid target value {}",
                self.target_value
            )));
        }

        if self.end_date <= self.start_date {
            return Err(EngineError::Validation(
                "end date must be after start date".to_string(),
            ));
        }

        let span = self.end_date - self.start_date;
        if span < Duration::days(settings.min_duration_days)
            || span > Duration::days(settings.max_duration_days)
        {
            return Err(EngineError::Validation(format!(
                "challenge duration {}s outside [{}, {}] days",
                span.num_seconds(),
                settings.min_duration_days,
                settings.max_duration_days
            )));
        }

        if self.invitees.len() > settings.max_invitees as usize {
            return Err(EngineError::Validation(format!(
                "{} invitees exceeds the limit of {}",
                self.invitees.len(),
                settings.max_invitees
            )));
        }

        Ok(())
    }

    /// Build the challenge record in its initial status.
    pub fn into_challenge(self, now: DateTime<Utc>) -> Challenge {
        let mut challenge = Challenge {
            id: Uuid::new_v4(),
            creator_id: self.creator_id,
            name: self.name,
            description: self.description,
            challenge_type: self.challenge_type,
            target_value: self.target_value,
            start_date: self.start_date,
            end_date: self.end_date,
            privacy: self.privacy,
            status: ChallengeStatus::Upcoming,
            created_at: now,
        };
        // Completion is claimed by finalization, never at creation.
        challenge.status = challenge.status_at(now).min(ChallengeStatus::Active);
        challenge
    }
}

/// Participant membership status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Active,
    Completed,
    /// Terminal; the user may never rejoin this challenge
    Withdrawn,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Active => "active",
            ParticipantStatus::Completed => "completed",
            ParticipantStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ParticipantStatus::Active),
            "completed" => Some(ParticipantStatus::Completed),
            "withdrawn" => Some(ParticipantStatus::Withdrawn),
            _ => None,
        }
    }
}

/// A user's membership and progress within one challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub user_id: Uuid,
    pub current_progress: f64,
    pub completion_percentage: f64,
    pub status: ParticipantStatus,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped on every write
    pub version: i64,
    /// Highest completion threshold already notified
    pub last_milestone_notified: Option<u32>,
    #[serde(default)]
    pub badges: Vec<BadgeKind>,
}

impl Participant {
    pub fn new(challenge_id: Uuid, user_id: Uuid, joined_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            challenge_id,
            user_id,
            current_progress: 0.0,
            completion_percentage: 0.0,
            status: ParticipantStatus::Active,
            joined_at,
            updated_at: joined_at,
            version: 0,
            last_milestone_notified: None,
            badges: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ParticipantStatus::Active
    }

    /// Set progress and recompute the completion percentage.
    pub fn set_progress(&mut self, progress: f64, challenge: &Challenge) {
        self.current_progress = progress;
        self.completion_percentage = challenge.percentage_of(progress);
    }
}
