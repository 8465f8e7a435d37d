//! Unit tests for challenge leaderboard ranking

use chrono::{Duration, TimeZone, Utc};
use fitquest::challenges::Participant;
use fitquest::leaderboards::rank;
use uuid::Uuid;

fn participant(challenge_id: Uuid, progress: f64, target: f64, joined_mins: i64) -> Participant {
    let joined = Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap() + Duration::minutes(joined_mins);
    let mut p = Participant::new(challenge_id, Uuid::new_v4(), joined);
    p.current_progress = progress;
    p.completion_percentage = progress / target * 100.0;
    p
}

/// Ranks are a permutation of 1..=n when nothing ties
#[test]
fn test_ranks_have_no_gaps() {
    let challenge = Uuid::new_v4();
    let participants: Vec<Participant> = (0..6)
        .map(|i| participant(challenge, 10.0 * i as f64, 100.0, i))
        .collect();

    let board = rank(&participants, None);
    let ranks: Vec<u32> = board.entries.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(board.entries[0].progress, 50.0);
}

/// Ranking is independent of input order and stable across calls
#[test]
fn test_rank_is_deterministic() {
    let challenge = Uuid::new_v4();
    let mut participants = vec![
        participant(challenge, 30.0, 100.0, 3),
        participant(challenge, 30.0, 100.0, 1),
        participant(challenge, 70.0, 100.0, 2),
        participant(challenge, 5.0, 100.0, 0),
    ];

    let first = rank(&participants, None);
    participants.reverse();
    let second = rank(&participants, None);
    assert_eq!(first, second);

    // Equal progress: earlier joiner ahead.
    assert_eq!(first.entries[1].joined_at, participants[2].joined_at);
}

#[test]
fn test_empty_challenge() {
    let board = rank(&[], Some(Uuid::new_v4()));
    assert!(board.is_empty());
    assert_eq!(board.len(), 0);
}
