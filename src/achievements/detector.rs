//! Achievement detection.
//!
//! Pure decision step run for every newly recorded workout. The caller
//! persists whatever comes back.

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;

use super::definitions::{DISTANCE_TIERS_KM, STREAK_TIERS, WORKOUT_COUNT_TIERS};
use super::types::{Achievement, AchievementKind, RecordKind};
use crate::error::EngineResult;
use crate::workouts::streaks::run_ending_at;
use crate::workouts::Workout;

/// Everything the detector looks at for one workout.
#[derive(Debug, Clone, Copy)]
pub struct DetectionInput<'a> {
    /// The user's workout history. May or may not already contain the new workout.
    pub history: &'a [Workout],
    pub new_workout: &'a Workout,
    /// Dedup keys of achievements the user already holds.
    pub unlocked: &'a HashSet<String>,
}

/// Aggregates over the user's workouts before the new one.
#[derive(Debug, Default)]
struct PriorStats {
    count: u32,
    distance_km: f64,
    dates: BTreeSet<NaiveDate>,
}

/// Return the achievements newly unlocked by `input.new_workout`.
///
/// Deterministic: the same input always yields the same list, in rule order.
pub fn detect(input: &DetectionInput<'_>) -> EngineResult<Vec<Achievement>> {
    let workout = input.new_workout;
    workout.validate()?;

    if workout.deleted {
        return Ok(Vec::new());
    }

    let prior: Vec<&Workout> = input
        .history
        .iter()
        .filter(|w| !w.deleted && w.id != workout.id && w.user_id == workout.user_id)
        .collect();

    let stats = prior.iter().fold(PriorStats::default(), |mut acc, w| {
        acc.count += 1;
        acc.distance_km += w.distance();
        acc.dates.insert(w.date());
        acc
    });

    let mut kinds = Vec::new();

    if stats.count == 0 {
        kinds.push(AchievementKind::FirstWorkout);
    }

    kinds.extend(streak_unlocks(&stats, workout));
    kinds.extend(distance_unlocks(&stats, workout));
    kinds.extend(count_unlocks(&stats));
    kinds.extend(personal_records(&prior, workout));

    let mut seen = HashSet::new();
    let unlocked: Vec<Achievement> = kinds
        .into_iter()
        .map(|kind| Achievement::new(workout.user_id, kind, workout.start_time, workout.id))
        .filter(|a| {
            let key = a.dedup_key();
            !input.unlocked.contains(&key) && seen.insert(key)
        })
        .collect();

    tracing::debug!(
        user_id = %workout.user_id,
        workout_id = %workout.id,
        unlocked = unlocked.len(),
        "Achievement detection finished"
    );

    Ok(unlocked)
}

/// Every tier the current run reaches. Tiers the user already holds are
/// dropped by the dedup filter in `detect`, so a backfilled workout that
/// joins two runs can still unlock a tier that was skipped.
fn streak_unlocks(stats: &PriorStats, workout: &Workout) -> Vec<AchievementKind> {
    let mut dates = stats.dates.clone();
    dates.insert(workout.date());
    let run = run_ending_at(&dates, workout.date());

    STREAK_TIERS
        .iter()
        .filter(|&&days| run >= days)
        .map(|&days| AchievementKind::Streak { days })
        .collect()
}

fn distance_unlocks(stats: &PriorStats, workout: &Workout) -> Vec<AchievementKind> {
    let before = stats.distance_km;
    let after = before + workout.distance();

    DISTANCE_TIERS_KM
        .iter()
        .filter(|&&km| before < km as f64 && after >= km as f64)
        .map(|&km| AchievementKind::DistanceMilestone { km })
        .collect()
}

fn count_unlocks(stats: &PriorStats) -> Vec<AchievementKind> {
    let after = stats.count + 1;

    WORKOUT_COUNT_TIERS
        .iter()
        .filter(|&&count| stats.count < count && after >= count)
        .map(|&count| AchievementKind::WorkoutCount { count })
        .collect()
}

/// Strict improvements over the best prior workout of the same type.
///
/// The first workout of a type sets the baseline and is not a record.
fn personal_records(prior: &[&Workout], workout: &Workout) -> Vec<AchievementKind> {
    let same_type: Vec<&Workout> = prior
        .iter()
        .copied()
        .filter(|w| w.workout_type == workout.workout_type)
        .collect();

    if same_type.is_empty() {
        return Vec::new();
    }

    let mut records = Vec::new();
    let record = |kind| AchievementKind::PersonalRecord {
        workout_type: workout.workout_type,
        record: kind,
    };

    let best_pace = same_type
        .iter()
        .filter_map(|w| w.effective_pace())
        .fold(None, |best: Option<f64>, p| Some(best.map_or(p, |b| b.min(p))));
    if let (Some(best), Some(pace)) = (best_pace, workout.effective_pace()) {
        if pace < best {
            records.push(record(RecordKind::FastestPace));
        }
    }

    let best_distance = same_type.iter().map(|w| w.distance()).fold(0.0, f64::max);
    if workout.distance() > best_distance {
        records.push(record(RecordKind::LongestDistance));
    }

    let best_duration = same_type.iter().map(|w| w.duration()).fold(0.0, f64::max);
    if workout.duration() > best_duration {
        records.push(record(RecordKind::LongestDuration));
    }

    records
}
