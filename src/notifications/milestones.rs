//! Milestone and rank-change notifications for challenge progress.

use uuid::Uuid;

use super::types::{NotificationKind, NotificationRequest};
use crate::leaderboards::Leaderboard;

/// Completion thresholds that trigger a notification.
pub const MILESTONE_THRESHOLDS: [u32; 4] = [25, 50, 75, 100];

/// Rank changes only notify inside this podium size.
pub const RANK_NOTIFY_TOP: u32 = 3;

/// Participant state on one side of a progress update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressState {
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    pub completion_percentage: f64,
    pub rank: Option<u32>,
    /// Highest threshold already notified before this state
    pub last_milestone_notified: Option<u32>,
}

/// Thresholds crossed between two percentages, ascending.
///
/// A threshold counts as crossed when `old < t <= new` and it is above
/// `already_notified`.
pub fn crossed_thresholds(old: f64, new: f64, already_notified: Option<u32>) -> Vec<u32> {
    let floor = already_notified.unwrap_or(0);
    MILESTONE_THRESHOLDS
        .iter()
        .copied()
        .filter(|&t| t > floor && old < t as f64 && t as f64 <= new)
        .collect()
}

/// Notifications for one participant's progress update.
pub fn on_progress_change(old: &ProgressState, new: &ProgressState) -> Vec<NotificationRequest> {
    let mut requests: Vec<NotificationRequest> = crossed_thresholds(
        old.completion_percentage,
        new.completion_percentage,
        old.last_milestone_notified,
    )
    .into_iter()
    .map(|threshold| {
        NotificationRequest::new(
            new.user_id,
            Some(new.challenge_id),
            NotificationKind::MilestoneReached {
                threshold,
                completion_percentage: new.completion_percentage,
            },
        )
    })
    .collect();

    if let Some(request) = rank_change(new.user_id, new.challenge_id, old.rank, new.rank) {
        requests.push(request);
    }

    requests
}

/// Highest notified threshold after applying `new_percentage`.
pub fn next_milestone_marker(
    old_percentage: f64,
    new_percentage: f64,
    already_notified: Option<u32>,
) -> Option<u32> {
    crossed_thresholds(old_percentage, new_percentage, already_notified)
        .last()
        .copied()
        .or(already_notified)
}

/// Rank notifications for everyone except `skip` whose position moved.
///
/// Covers participants displaced by someone else's update.
pub fn rank_changes(
    challenge_id: Uuid,
    before: &Leaderboard,
    after: &Leaderboard,
    skip: Uuid,
) -> Vec<NotificationRequest> {
    after
        .entries
        .iter()
        .filter(|e| e.user_id != skip)
        .filter_map(|e| rank_change(e.user_id, challenge_id, before.rank_of(e.user_id), Some(e.rank)))
        .collect()
}

fn rank_change(
    user_id: Uuid,
    challenge_id: Uuid,
    old_rank: Option<u32>,
    new_rank: Option<u32>,
) -> Option<NotificationRequest> {
    let new_rank = new_rank?;
    if old_rank == Some(new_rank) || new_rank > RANK_NOTIFY_TOP {
        return None;
    }
    Some(NotificationRequest::new(
        user_id,
        Some(challenge_id),
        NotificationKind::RankChanged { old_rank, new_rank },
    ))
}
