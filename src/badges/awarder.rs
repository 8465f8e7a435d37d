//! Badge awarding at challenge completion.
//!
//! Computes terminal awards from the final standings. Running it exactly
//! once per challenge is guarded by `ChallengeStore::claim_completion`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::challenges::{Challenge, Participant};
use crate::leaderboards::{rank, Leaderboard};

/// Percentage at which a participant counts as having completed.
pub const COMPLETION_PERCENTAGE: f64 = 100.0;

/// Percentage that earns the super-challenger badge.
pub const SUPER_CHALLENGER_PERCENTAGE: f64 = 150.0;

/// Terminal badge kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeKind {
    Gold,
    Silver,
    Bronze,
    /// Completed the target without reaching the podium
    Challenger,
    /// Reached 150% of the target; stacks with the others
    SuperChallenger,
}

impl BadgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeKind::Gold => "gold",
            BadgeKind::Silver => "silver",
            BadgeKind::Bronze => "bronze",
            BadgeKind::Challenger => "challenger",
            BadgeKind::SuperChallenger => "super_challenger",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gold" => Some(BadgeKind::Gold),
            "silver" => Some(BadgeKind::Silver),
            "bronze" => Some(BadgeKind::Bronze),
            "challenger" => Some(BadgeKind::Challenger),
            "super_challenger" => Some(BadgeKind::SuperChallenger),
            _ => None,
        }
    }

    /// Podium badge for a final rank.
    pub fn for_rank(rank: u32) -> Option<Self> {
        match rank {
            1 => Some(BadgeKind::Gold),
            2 => Some(BadgeKind::Silver),
            3 => Some(BadgeKind::Bronze),
            _ => None,
        }
    }
}

/// Badge attached to a participant at finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeAward {
    pub challenge_id: Uuid,
    pub participant_id: Uuid,
    pub user_id: Uuid,
    pub badge: BadgeKind,
    pub final_rank: u32,
    pub completion_percentage: f64,
    pub awarded_at: DateTime<Utc>,
}

/// Outcome of finalizing a challenge.
#[derive(Debug, Clone, Default)]
pub struct Finalization {
    /// Final standings snapshot
    pub leaderboard: Leaderboard,
    pub awards: Vec<BadgeAward>,
    /// Participants that reached the target and move to completed
    pub completed_participants: Vec<Uuid>,
}

impl Finalization {
    /// Badges awarded to one participant.
    pub fn badges_for(&self, participant_id: Uuid) -> Vec<BadgeKind> {
        self.awards
            .iter()
            .filter(|a| a.participant_id == participant_id)
            .map(|a| a.badge)
            .collect()
    }
}

/// Compute final awards for a challenge.
pub fn finalize(challenge: &Challenge, participants: &[Participant], now: DateTime<Utc>) -> Finalization {
    let leaderboard = rank(participants, None);
    let mut awards = Vec::new();
    let mut completed_participants = Vec::new();

    for entry in &leaderboard.entries {
        let award = |badge| BadgeAward {
            challenge_id: challenge.id,
            participant_id: entry.participant_id,
            user_id: entry.user_id,
            badge,
            final_rank: entry.rank,
            completion_percentage: entry.completion_percentage,
            awarded_at: now,
        };

        let completed = entry.completion_percentage >= COMPLETION_PERCENTAGE;
        if completed {
            completed_participants.push(entry.participant_id);
        }

        match BadgeKind::for_rank(entry.rank) {
            Some(podium) => awards.push(award(podium)),
            None if completed => awards.push(award(BadgeKind::Challenger)),
            None => {}
        }

        if entry.completion_percentage >= SUPER_CHALLENGER_PERCENTAGE {
            awards.push(award(BadgeKind::SuperChallenger));
        }
    }

    tracing::debug!(
        challenge_id = %challenge.id,
        awards = awards.len(),
        completed = completed_participants.len(),
        "Computed final badge awards"
    );

    Finalization {
        leaderboard,
        awards,
        completed_participants,
    }
}
