//! Unit tests for the achievement catalogue and detection rules

use std::collections::HashSet;

use chrono::{Duration, TimeZone, Utc};
use fitquest::achievements::definitions::milestone_catalogue;
use fitquest::achievements::{detect, AchievementKind, CelebrationTier, DetectionInput, RecordKind};
use fitquest::{Workout, WorkoutType};
use uuid::Uuid;

fn ride(user: Uuid, day: i64, minutes: f64, km: f64) -> Workout {
    let start = Utc.with_ymd_and_hms(2025, 5, 1, 17, 30, 0).unwrap();
    Workout::new(user, WorkoutType::Cycling, start + Duration::days(day), minutes, km)
}

#[test]
fn test_catalogue_keys_are_unique() {
    let catalogue = milestone_catalogue();
    let keys: HashSet<String> = catalogue
        .iter()
        .map(|kind| fitquest::achievements::Achievement::new(Uuid::nil(), kind.clone(), Utc::now(), Uuid::nil()).dedup_key())
        .collect();
    assert_eq!(keys.len(), catalogue.len());
}

#[test]
fn test_tiers_escalate_with_streak_length() {
    assert_eq!(AchievementKind::Streak { days: 3 }.tier(), CelebrationTier::Basic);
    assert!(AchievementKind::Streak { days: 100 }.tier() > AchievementKind::Streak { days: 3 }.tier());
}

#[test]
fn test_detection_is_deterministic() {
    let user = Uuid::new_v4();
    let history = vec![ride(user, 0, 60.0, 20.0), ride(user, 1, 50.0, 18.0)];
    let new_workout = ride(user, 2, 90.0, 30.0);
    let unlocked = HashSet::new();
    let input = DetectionInput {
        history: &history,
        new_workout: &new_workout,
        unlocked: &unlocked,
    };

    let first = detect(&input).unwrap();
    assert_eq!(first, detect(&input).unwrap());
    assert!(first.contains(&fitquest::achievements::Achievement::new(
        user,
        AchievementKind::PersonalRecord {
            workout_type: WorkoutType::Cycling,
            record: RecordKind::LongestDistance,
        },
        new_workout.start_time,
        new_workout.id,
    )));
    assert!(first
        .iter()
        .any(|a| a.kind == AchievementKind::Streak { days: 3 }));
}

#[test]
fn test_already_unlocked_is_skipped() {
    let user = Uuid::new_v4();
    let workout = ride(user, 0, 30.0, 12.0);
    let unlocked: HashSet<String> = ["first_workout".to_string(), "distance:10".to_string()].into();
    let input = DetectionInput {
        history: &[],
        new_workout: &workout,
        unlocked: &unlocked,
    };
    assert!(detect(&input).unwrap().is_empty());
}
