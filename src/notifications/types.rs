//! Notification requests handed to the delivery collaborator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::achievements::{AchievementKind, CelebrationTier};
use crate::badges::BadgeKind;

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationKind {
    AchievementUnlocked {
        achievement: AchievementKind,
        tier: CelebrationTier,
        title: String,
    },
    MilestoneReached {
        threshold: u32,
        completion_percentage: f64,
    },
    RankChanged {
        old_rank: Option<u32>,
        new_rank: u32,
    },
    BadgeAwarded {
        badge: BadgeKind,
        final_rank: Option<u32>,
    },
    ChallengeCompleted {
        final_rank: Option<u32>,
        completion_percentage: f64,
    },
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::AchievementUnlocked { .. } => "achievement_unlocked",
            NotificationKind::MilestoneReached { .. } => "milestone_reached",
            NotificationKind::RankChanged { .. } => "rank_changed",
            NotificationKind::BadgeAwarded { .. } => "badge_awarded",
            NotificationKind::ChallengeCompleted { .. } => "challenge_completed",
        }
    }
}

/// Abstract notification; delivery (push, email) happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub user_id: Uuid,
    pub challenge_id: Option<Uuid>,
    pub kind: NotificationKind,
}

impl NotificationRequest {
    pub fn new(user_id: Uuid, challenge_id: Option<Uuid>, kind: NotificationKind) -> Self {
        Self {
            user_id,
            challenge_id,
            kind,
        }
    }

    /// JSON payload for the delivery transport.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
