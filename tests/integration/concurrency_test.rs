//! Concurrent submissions against shared challenges.

use std::sync::Arc;
use std::thread;

use fitquest::achievements::AchievementKind;
use fitquest::challenges::ChallengeType;
use uuid::Uuid;

use crate::harness::{after, create_challenge, in_memory_engine, run, start};

#[test]
fn test_duplicate_submissions_count_once() {
    let (engine, _rx) = in_memory_engine();
    let user = Uuid::new_v4();
    let challenge = create_challenge(&engine, user, ChallengeType::TotalDistance, 100.0);
    let workout = run(user, 0, 8.0);

    let replays: usize = thread::scope(|scope| {
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let workout = workout.clone();
                scope.spawn(move || engine.record_workout(workout, after(0)).unwrap().replayed)
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|replayed| *replayed)
            .count()
    });

    assert_eq!(replays, 5);
    assert_eq!(engine.participant(challenge.id, user).unwrap().current_progress, 8.0);
    let firsts = engine
        .achievements(user)
        .unwrap()
        .into_iter()
        .filter(|a| a.kind == AchievementKind::FirstWorkout)
        .count();
    assert_eq!(firsts, 1);
}

#[test]
fn test_many_users_race_with_finalizer() {
    let (engine, _rx) = in_memory_engine();
    let creator = Uuid::new_v4();
    let challenge = create_challenge(&engine, creator, ChallengeType::TotalDistance, 50.0);

    let mut users = vec![creator];
    for _ in 0..9 {
        let user = Uuid::new_v4();
        engine.join_challenge(challenge.id, user, start()).unwrap();
        users.push(user);
    }

    thread::scope(|scope| {
        for &user in &users {
            let engine = Arc::clone(&engine);
            scope.spawn(move || {
                for day in 0..4 {
                    let outcome = engine.record_workout(run(user, day, 5.0), after(day)).unwrap();
                    assert!(outcome.is_complete());
                }
            });
        }
    });

    let finalized: usize = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let end = challenge.end_date;
                scope.spawn(move || engine.advance_challenges(end).unwrap().finalized.len())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });
    assert_eq!(finalized, 1);

    let board = engine.leaderboard(challenge.id, None).unwrap();
    assert_eq!(board.len(), users.len());
    assert!(board.entries.iter().all(|e| e.progress == 20.0));
    // Equal progress; the creator joined a day earlier.
    assert_eq!(board.entries[0].user_id, creator);
    assert!(board.entries[1..].iter().all(|e| e.rank == 2));
}
