//! Unit tests for milestone notification thresholds

use fitquest::notifications::milestones::{crossed_thresholds, next_milestone_marker};
use fitquest::notifications::{on_progress_change, NotificationKind, ProgressState};
use uuid::Uuid;

fn state(pct: f64, rank: Option<u32>, notified: Option<u32>) -> ProgressState {
    ProgressState {
        user_id: Uuid::nil(),
        challenge_id: Uuid::nil(),
        completion_percentage: pct,
        rank,
        last_milestone_notified: notified,
    }
}

/// 40% to 80% fires 50 and 75 only
#[test]
fn test_forty_to_eighty() {
    let requests = on_progress_change(&state(40.0, Some(2), Some(25)), &state(80.0, Some(2), Some(75)));
    let thresholds: Vec<u32> = requests
        .iter()
        .filter_map(|r| match r.kind {
            NotificationKind::MilestoneReached { threshold, .. } => Some(threshold),
            _ => None,
        })
        .collect();
    assert_eq!(thresholds, vec![50, 75]);
    assert_eq!(requests.len(), 2);
}

#[test]
fn test_exact_threshold_counts_as_crossed() {
    assert_eq!(crossed_thresholds(99.9, 100.0, Some(75)), vec![100]);
    assert!(crossed_thresholds(100.0, 140.0, Some(100)).is_empty());
}

#[test]
fn test_identical_replay_fires_nothing() {
    let old = state(60.0, Some(1), Some(50));
    assert!(on_progress_change(&old, &old).is_empty());
}

#[test]
fn test_rank_outside_podium_is_silent() {
    let requests = on_progress_change(&state(10.0, Some(6), None), &state(12.0, Some(4), None));
    assert!(requests.is_empty());

    let requests = on_progress_change(&state(10.0, Some(4), None), &state(12.0, Some(3), None));
    assert_eq!(
        requests[0].kind,
        NotificationKind::RankChanged {
            old_rank: Some(4),
            new_rank: 3
        }
    );
}

#[test]
fn test_marker_keeps_highest() {
    assert_eq!(next_milestone_marker(10.0, 60.0, None), Some(50));
    assert_eq!(next_milestone_marker(60.0, 30.0, Some(50)), Some(50));
    assert_eq!(next_milestone_marker(0.0, 10.0, None), None);
}
