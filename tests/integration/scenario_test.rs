//! End-to-end engine scenarios: achievements, rankings, milestones, badges.

use chrono::Duration;
use fitquest::achievements::{AchievementKind, CelebrationTier};
use fitquest::badges::BadgeKind;
use fitquest::challenges::{ChallengeStatus, ChallengeType, ParticipantStatus};
use fitquest::notifications::NotificationKind;
use uuid::Uuid;

use crate::harness::{after, create_challenge, in_memory_engine, run, start};

fn milestones_for(notifications: &[fitquest::notifications::NotificationRequest], user: Uuid) -> Vec<u32> {
    notifications
        .iter()
        .filter(|n| n.user_id == user)
        .filter_map(|n| match n.kind {
            NotificationKind::MilestoneReached { threshold, .. } => Some(threshold),
            _ => None,
        })
        .collect()
}

#[test]
fn test_first_workout_then_two_day_streak() {
    let (engine, _rx) = in_memory_engine();
    let user = Uuid::new_v4();

    let first = engine.record_workout(run(user, 0, 5.0), after(0)).unwrap();
    assert_eq!(first.achievements.len(), 1);
    assert_eq!(first.achievements[0].kind, AchievementKind::FirstWorkout);
    assert_eq!(first.achievements[0].tier, CelebrationTier::Basic);

    let second = engine.record_workout(run(user, 1, 5.0), after(1)).unwrap();
    assert!(second
        .achievements
        .iter()
        .all(|a| !matches!(a.kind, AchievementKind::Streak { .. })));

    let third = engine.record_workout(run(user, 2, 5.0), after(2)).unwrap();
    assert!(third
        .achievements
        .iter()
        .any(|a| a.kind == AchievementKind::Streak { days: 3 }));
    // 15 km total crosses the 10 km milestone on the second run.
    assert!(second
        .achievements
        .iter()
        .any(|a| a.kind == AchievementKind::DistanceMilestone { km: 10 }));
}

#[test]
fn test_late_logged_day_bridges_streak() {
    let (engine, _rx) = in_memory_engine();
    let user = Uuid::new_v4();

    for day in [0, 1, 2, 4, 5, 6] {
        engine.record_workout(run(user, day, 3.0), after(day)).unwrap();
    }
    engine.record_workout(run(user, 3, 3.0), after(6)).unwrap();
    let outcome = engine.record_workout(run(user, 7, 3.0), after(7)).unwrap();

    assert!(outcome
        .achievements
        .iter()
        .any(|a| a.kind == AchievementKind::Streak { days: 7 }));
    let streaks: Vec<_> = engine
        .achievements(user)
        .unwrap()
        .into_iter()
        .filter_map(|a| match a.kind {
            AchievementKind::Streak { days } => Some(days),
            _ => None,
        })
        .collect();
    assert_eq!(streaks.len(), 2);
    assert!(streaks.contains(&3) && streaks.contains(&7));
}

#[test]
fn test_overtake_reorders_and_fires_fifty_percent() {
    let (engine, _rx) = in_memory_engine();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let challenge = create_challenge(&engine, a, ChallengeType::TotalDistance, 100.0);
    engine.join_challenge(challenge.id, b, start()).unwrap();

    engine.record_workout(run(a, 0, 40.0), after(0)).unwrap();
    engine.record_workout(run(b, 0, 55.0), after(0)).unwrap();

    let before = engine.leaderboard(challenge.id, None).unwrap();
    assert_eq!(before.rank_of(b), Some(1));
    assert_eq!(before.rank_of(a), Some(2));

    let outcome = engine.record_workout(run(a, 1, 20.0), after(1)).unwrap();
    assert_eq!(outcome.updated_participants[0].current_progress, 60.0);

    let after_board = engine.leaderboard(challenge.id, Some(a)).unwrap();
    assert_eq!(after_board.entries[0].user_id, a);
    assert_eq!(after_board.entries[0].completion_percentage, 60.0);
    assert!(after_board.entries[0].is_current_viewer);
    assert_eq!(after_board.rank_of(b), Some(2));

    assert_eq!(milestones_for(&outcome.notifications, a), vec![50]);
    assert!(outcome.notifications.iter().any(|n| n.user_id == a
        && n.kind
            == NotificationKind::RankChanged {
                old_rank: Some(2),
                new_rank: 1
            }));
    assert!(outcome.notifications.iter().any(|n| n.user_id == b
        && n.kind
            == NotificationKind::RankChanged {
                old_rank: Some(1),
                new_rank: 2
            }));
}

#[test]
fn test_jump_fires_each_crossed_threshold_once() {
    let (engine, _rx) = in_memory_engine();
    let user = Uuid::new_v4();
    let challenge = create_challenge(&engine, user, ChallengeType::TotalDistance, 100.0);

    engine.record_workout(run(user, 0, 40.0), after(0)).unwrap();
    let outcome = engine.record_workout(run(user, 1, 40.0), after(1)).unwrap();

    assert_eq!(milestones_for(&outcome.notifications, user), vec![50, 75]);
    assert_eq!(
        engine.participant(challenge.id, user).unwrap().last_milestone_notified,
        Some(75)
    );
}

#[test]
fn test_consecutive_days_drop_does_not_refire() {
    let (engine, _rx) = in_memory_engine();
    let user = Uuid::new_v4();
    let challenge = create_challenge(&engine, user, ChallengeType::ConsecutiveDays, 4.0);

    let mut fired = Vec::new();
    for day in [0, 1, 3, 4] {
        let outcome = engine.record_workout(run(user, day, 3.0), after(day)).unwrap();
        fired.extend(milestones_for(&outcome.notifications, user));
    }

    assert_eq!(fired, vec![25, 50]);
    let participant = engine.participant(challenge.id, user).unwrap();
    assert_eq!(participant.current_progress, 2.0);
    assert_eq!(participant.completion_percentage, 50.0);
}

#[test]
fn test_specific_type_challenge_ignores_other_sports() {
    let (engine, _rx) = in_memory_engine();
    let user = Uuid::new_v4();
    let challenge = create_challenge(
        &engine,
        user,
        ChallengeType::SpecificWorkoutType {
            workout_type: fitquest::WorkoutType::Swimming,
            metric: fitquest::challenges::ProgressMetric::Duration,
        },
        300.0,
    );

    engine.record_workout(run(user, 0, 10.0), after(0)).unwrap();
    let swim = fitquest::Workout::new(
        user,
        fitquest::WorkoutType::Swimming,
        start() + Duration::days(1) + Duration::hours(6),
        45.0,
        1.5,
    );
    engine.record_workout(swim, after(1)).unwrap();

    assert_eq!(engine.participant(challenge.id, user).unwrap().current_progress, 45.0);
}

#[test]
fn test_final_standings_award_badges_once() {
    let (engine, rx) = in_memory_engine();
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let challenge = create_challenge(&engine, a, ChallengeType::TotalDistance, 100.0);
    engine.join_challenge(challenge.id, b, start()).unwrap();
    engine.join_challenge(challenge.id, c, start()).unwrap();

    engine.record_workout(run(a, 0, 120.0), after(0)).unwrap();
    engine.record_workout(run(b, 0, 100.0), after(0)).unwrap();
    engine.record_workout(run(c, 0, 80.0), after(0)).unwrap();
    rx.try_iter().for_each(drop);

    let report = engine.advance_challenges(challenge.end_date).unwrap();
    assert_eq!(report.finalized, vec![challenge.id]);

    let a_record = engine.participant(challenge.id, a).unwrap();
    let b_record = engine.participant(challenge.id, b).unwrap();
    let c_record = engine.participant(challenge.id, c).unwrap();
    assert_eq!(a_record.badges, vec![BadgeKind::Gold]);
    assert_eq!(b_record.badges, vec![BadgeKind::Silver]);
    assert_eq!(c_record.badges, vec![BadgeKind::Bronze]);
    assert_eq!(a_record.status, ParticipantStatus::Completed);
    assert_eq!(b_record.status, ParticipantStatus::Completed);
    assert_eq!(c_record.status, ParticipantStatus::Active);

    let delivered: Vec<_> = rx.try_iter().collect();
    assert_eq!(
        delivered
            .iter()
            .filter(|n| matches!(n.kind, NotificationKind::BadgeAwarded { .. }))
            .count(),
        3
    );

    assert!(engine
        .finalize_challenge(challenge.id, challenge.end_date + Duration::days(1))
        .unwrap()
        .is_none());
    assert!(engine
        .advance_challenges(challenge.end_date + Duration::days(1))
        .unwrap()
        .is_empty());
    assert_eq!(rx.try_iter().count(), 0);
    assert_eq!(
        engine.challenge(challenge.id).unwrap().status,
        ChallengeStatus::Completed
    );
}

#[test]
fn test_withdrawn_participant_stops_counting() {
    let (engine, _rx) = in_memory_engine();
    let (creator, quitter) = (Uuid::new_v4(), Uuid::new_v4());
    let challenge = create_challenge(&engine, creator, ChallengeType::TotalDistance, 50.0);
    engine.join_challenge(challenge.id, quitter, start()).unwrap();

    engine.record_workout(run(quitter, 0, 10.0), after(0)).unwrap();
    assert!(engine.withdraw(challenge.id, quitter, after(0)).unwrap());
    let outcome = engine.record_workout(run(quitter, 1, 10.0), after(1)).unwrap();

    assert!(outcome.updated_participants.is_empty());
    assert_eq!(engine.participant(challenge.id, quitter).unwrap().current_progress, 10.0);
    assert!(engine.leaderboard(challenge.id, None).unwrap().rank_of(quitter).is_none());
}
