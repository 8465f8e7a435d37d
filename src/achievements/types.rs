//! Achievement records and their kinds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::definitions;
use crate::workouts::WorkoutType;

/// UI significance of an unlock. Ordered from least to most significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CelebrationTier {
    Basic,
    Fireworks,
    Epic,
}

impl CelebrationTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CelebrationTier::Basic => "basic",
            CelebrationTier::Fireworks => "fireworks",
            CelebrationTier::Epic => "epic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "basic" => Some(CelebrationTier::Basic),
            "fireworks" => Some(CelebrationTier::Fireworks),
            "epic" => Some(CelebrationTier::Epic),
            _ => None,
        }
    }
}

/// Which personal best a record improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Lowest minutes per kilometer
    FastestPace,
    LongestDistance,
    LongestDuration,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::FastestPace => "fastest_pace",
            RecordKind::LongestDistance => "longest_distance",
            RecordKind::LongestDuration => "longest_duration",
        }
    }
}

/// Detection rule that produced an achievement, with its milestone value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AchievementKind {
    FirstWorkout,
    Streak { days: u32 },
    DistanceMilestone { km: u32 },
    WorkoutCount { count: u32 },
    PersonalRecord {
        workout_type: WorkoutType,
        record: RecordKind,
    },
}

impl AchievementKind {
    /// Celebration tier for this kind and milestone.
    pub fn tier(&self) -> CelebrationTier {
        definitions::tier_for(self)
    }

    /// Short display title.
    pub fn title(&self) -> String {
        match self {
            AchievementKind::FirstWorkout => "First Workout".to_string(),
            AchievementKind::Streak { days } => format!("{}-Day Streak", days),
            AchievementKind::DistanceMilestone { km } => format!("{} km Club", km),
            AchievementKind::WorkoutCount { count } => format!("{} Workouts", count),
            AchievementKind::PersonalRecord {
                workout_type,
                record,
            } => {
                let what = match record {
                    RecordKind::FastestPace => "fastest pace",
                    RecordKind::LongestDistance => "longest distance",
                    RecordKind::LongestDuration => "longest duration",
                };
                format!("New {} record: {}", workout_type, what)
            }
        }
    }
}

/// A one-time unlock for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub user_id: Uuid,
    pub kind: AchievementKind,
    pub tier: CelebrationTier,
    pub achieved_at: DateTime<Utc>,
    /// Workout that triggered the unlock
    pub workout_id: Uuid,
}

impl Achievement {
    pub fn new(user_id: Uuid, kind: AchievementKind, achieved_at: DateTime<Utc>, workout_id: Uuid) -> Self {
        Self {
            user_id,
            kind,
            tier: kind.tier(),
            achieved_at,
            workout_id,
        }
    }

    /// Identity used to enforce at most one unlock per (user, type, milestone).
    ///
    /// Personal records can be beaten again later, so their key also carries
    /// the triggering workout.
    pub fn dedup_key(&self) -> String {
        match self.kind {
            AchievementKind::FirstWorkout => "first_workout".to_string(),
            AchievementKind::Streak { days } => format!("streak:{}", days),
            AchievementKind::DistanceMilestone { km } => format!("distance:{}", km),
            AchievementKind::WorkoutCount { count } => format!("workout_count:{}", count),
            AchievementKind::PersonalRecord {
                workout_type,
                record,
            } => format!(
                "personal_record:{}:{}:{}",
                workout_type.as_str(),
                record.as_str(),
                self.workout_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(CelebrationTier::Basic < CelebrationTier::Fireworks);
        assert!(CelebrationTier::Fireworks < CelebrationTier::Epic);
    }

    #[test]
    fn test_dedup_key_ignores_workout_for_milestones() {
        let user = Uuid::new_v4();
        let a = Achievement::new(user, AchievementKind::Streak { days: 7 }, Utc::now(), Uuid::new_v4());
        let b = Achievement::new(user, AchievementKind::Streak { days: 7 }, Utc::now(), Uuid::new_v4());
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_dedup_key_distinguishes_personal_records() {
        let user = Uuid::new_v4();
        let kind = AchievementKind::PersonalRecord {
            workout_type: WorkoutType::Running,
            record: RecordKind::FastestPace,
        };
        let a = Achievement::new(user, kind, Utc::now(), Uuid::new_v4());
        let b = Achievement::new(user, kind, Utc::now(), Uuid::new_v4());
        assert_ne!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_kind_serializes_tagged() {
        let json = serde_json::to_string(&AchievementKind::DistanceMilestone { km: 100 }).unwrap();
        assert_eq!(json, r#"{"kind":"distance_milestone","km":100}"#);
    }
}
