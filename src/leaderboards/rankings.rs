//! Challenge leaderboard ranking.
//!
//! Leaderboards are views computed from participant records on demand; they
//! are never stored.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::challenges::{Participant, ParticipantStatus};

/// Leaderboard entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based competition rank
    pub rank: u32,
    pub user_id: Uuid,
    pub participant_id: Uuid,
    pub progress: f64,
    pub completion_percentage: f64,
    pub joined_at: DateTime<Utc>,
    pub is_current_viewer: bool,
}

/// Ordered standings for one challenge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn entry_for(&self, user_id: Uuid) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.user_id == user_id)
    }

    pub fn rank_of(&self, user_id: Uuid) -> Option<u32> {
        self.entry_for(user_id).map(|e| e.rank)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ranking order: percentage desc, progress desc, earlier join first.
fn standing_cmp(a: &Participant, b: &Participant) -> Ordering {
    b.completion_percentage
        .total_cmp(&a.completion_percentage)
        .then_with(|| b.current_progress.total_cmp(&a.current_progress))
        .then_with(|| a.joined_at.cmp(&b.joined_at))
}

/// Rank participants of a challenge.
///
/// Withdrawn participants are left out. Entries tied on every ranking key
/// share a rank and the next entry skips ahead (1, 1, 3).
pub fn rank(participants: &[Participant], viewer: Option<Uuid>) -> Leaderboard {
    let mut standings: Vec<&Participant> = participants
        .iter()
        .filter(|p| p.status != ParticipantStatus::Withdrawn)
        .collect();

    // user_id only keeps the listing stable among full ties; it never splits a rank.
    standings.sort_by(|a, b| standing_cmp(a, b).then_with(|| a.user_id.cmp(&b.user_id)));

    let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(standings.len());
    for (index, participant) in standings.iter().enumerate() {
        let rank = match index.checked_sub(1).map(|i| standings[i]) {
            Some(previous) if standing_cmp(previous, participant) == Ordering::Equal => {
                entries[index - 1].rank
            }
            _ => index as u32 + 1,
        };

        entries.push(LeaderboardEntry {
            rank,
            user_id: participant.user_id,
            participant_id: participant.id,
            progress: participant.current_progress,
            completion_percentage: participant.completion_percentage,
            joined_at: participant.joined_at,
            is_current_viewer: viewer == Some(participant.user_id),
        });
    }

    Leaderboard { entries }
}
