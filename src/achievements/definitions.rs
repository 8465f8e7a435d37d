//! Achievement catalogue: milestone thresholds and celebration tiers.

use super::types::{AchievementKind, CelebrationTier};

/// Consecutive-day streak tiers.
pub const STREAK_TIERS: [u32; 4] = [3, 7, 30, 100];

/// Cumulative lifetime distance tiers in kilometers.
pub const DISTANCE_TIERS_KM: [u32; 4] = [10, 100, 500, 1000];

/// Total workout count tiers.
pub const WORKOUT_COUNT_TIERS: [u32; 3] = [10, 50, 100];

/// Static tier mapping. Rarer milestones get louder celebrations.
pub fn tier_for(kind: &AchievementKind) -> CelebrationTier {
    match *kind {
        AchievementKind::FirstWorkout => CelebrationTier::Basic,
        AchievementKind::Streak { days } => match days {
            0..=6 => CelebrationTier::Basic,
            7..=29 => CelebrationTier::Fireworks,
            _ => CelebrationTier::Epic,
        },
        AchievementKind::DistanceMilestone { km } => match km {
            0..=99 => CelebrationTier::Basic,
            100..=499 => CelebrationTier::Fireworks,
            _ => CelebrationTier::Epic,
        },
        AchievementKind::WorkoutCount { count } => match count {
            0..=49 => CelebrationTier::Basic,
            50..=99 => CelebrationTier::Fireworks,
            _ => CelebrationTier::Epic,
        },
        AchievementKind::PersonalRecord { .. } => CelebrationTier::Fireworks,
    }
}

/// Every milestone achievement kind, in catalogue order.
///
/// Personal records are open-ended and not listed.
pub fn milestone_catalogue() -> Vec<AchievementKind> {
    let mut kinds = vec![AchievementKind::FirstWorkout];
    kinds.extend(STREAK_TIERS.iter().map(|&days| AchievementKind::Streak { days }));
    kinds.extend(
        DISTANCE_TIERS_KM
            .iter()
            .map(|&km| AchievementKind::DistanceMilestone { km }),
    );
    kinds.extend(
        WORKOUT_COUNT_TIERS
            .iter()
            .map(|&count| AchievementKind::WorkoutCount { count }),
    );
    kinds
}
