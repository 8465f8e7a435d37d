//! Replayed workout events must never double-count or double-award.

use std::sync::Arc;

use fitquest::challenges::ChallengeType;
use fitquest::storage::WorkoutLedger;
use fitquest::Database;
use tempfile::TempDir;
use uuid::Uuid;

use crate::harness::{after, create_challenge, engine_on, in_memory_engine, run};

#[test]
fn test_replay_after_restart_is_noop() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fitquest.db");
    let user = Uuid::new_v4();
    let workout = run(user, 0, 12.0);

    let challenge_id = {
        let (engine, _rx) = engine_on(Arc::new(Database::open(&path).unwrap()));
        let challenge = create_challenge(&engine, user, ChallengeType::TotalDistance, 100.0);
        let outcome = engine.record_workout(workout.clone(), after(0)).unwrap();
        assert!(!outcome.replayed);
        assert_eq!(outcome.achievements.len(), 2);
        challenge.id
    };

    let (engine, rx) = engine_on(Arc::new(Database::open(&path).unwrap()));
    let outcome = engine.record_workout(workout, after(0)).unwrap();

    assert!(outcome.replayed);
    assert!(outcome.notifications.is_empty());
    assert_eq!(rx.try_iter().count(), 0);
    assert_eq!(engine.achievements(user).unwrap().len(), 2);
    let participant = engine.participant(challenge_id, user).unwrap();
    assert_eq!(participant.current_progress, 12.0);
    assert_eq!(participant.version, 1);
}

#[test]
fn test_new_workouts_after_replay_still_count() {
    let (engine, _rx) = in_memory_engine();
    let user = Uuid::new_v4();
    let challenge = create_challenge(&engine, user, ChallengeType::TotalDuration, 600.0);

    let first = run(user, 0, 5.0);
    engine.record_workout(first.clone(), after(0)).unwrap();
    engine.record_workout(first, after(0)).unwrap();
    engine.record_workout(run(user, 1, 5.0), after(1)).unwrap();

    let participant = engine.participant(challenge.id, user).unwrap();
    assert_eq!(participant.current_progress, 60.0);
    assert_eq!(participant.completion_percentage, 10.0);
}

#[test]
fn test_soft_deleted_workout_leaves_history() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let (engine, _rx) = engine_on(Arc::clone(&db));
    let user = Uuid::new_v4();

    let doomed = run(user, 0, 4.0);
    engine.record_workout(doomed.clone(), after(0)).unwrap();
    {
        let conn = db.connection();
        assert!(WorkoutLedger::new(&conn).soft_delete(doomed.id).unwrap());
    }

    // With the only prior workout deleted, the next one counts as the first again,
    // but the first-workout achievement is already held.
    let outcome = engine.record_workout(run(user, 1, 4.0), after(1)).unwrap();
    assert!(outcome.achievements.is_empty());
    assert_eq!(engine.achievements(user).unwrap().len(), 1);
}
