//! Membership rules for joining and leaving challenges.

use chrono::{DateTime, Utc};

use super::types::{Challenge, ChallengeStatus, Participant, ParticipantStatus};
use crate::error::{EngineError, EngineResult};
use crate::storage::config::ChallengeSettings;

/// Check whether a user may join.
///
/// `existing` is the user's participant record for this challenge, if any;
/// `participant_count` counts non-withdrawn participants.
pub fn check_join(
    challenge: &Challenge,
    existing: Option<&Participant>,
    participant_count: u32,
    settings: &ChallengeSettings,
    now: DateTime<Utc>,
) -> EngineResult<()> {
    if challenge.status_at(now) == ChallengeStatus::Completed {
        return Err(EngineError::ChallengeEnded);
    }

    match existing.map(|p| p.status) {
        Some(ParticipantStatus::Withdrawn) => return Err(EngineError::RejoinAfterWithdrawal),
        Some(_) => return Err(EngineError::AlreadyJoined),
        None => {}
    }

    if participant_count >= settings.max_participants {
        return Err(EngineError::ChallengeFull(settings.max_participants));
    }

    Ok(())
}

/// Move a participant to the terminal withdrawn state.
///
/// Returns false if the participant had already withdrawn.
pub fn withdraw(participant: &mut Participant, now: DateTime<Utc>) -> bool {
    if participant.status == ParticipantStatus::Withdrawn {
        return false;
    }
    participant.status = ParticipantStatus::Withdrawn;
    participant.updated_at = now;
    true
}
