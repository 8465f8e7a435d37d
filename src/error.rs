//! Engine error types.

use thiserror::Error;
use uuid::Uuid;

use crate::storage::DatabaseError;

/// Errors surfaced by the gamification engine.
///
/// Replays and finalize races are not errors; they resolve to no-ops.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or missing workout/challenge fields.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Challenge not found: {0}")]
    ChallengeNotFound(Uuid),

    #[error("User {user_id} is not a participant of challenge {challenge_id}")]
    NotJoined { challenge_id: Uuid, user_id: Uuid },

    #[error("Already joined this challenge")]
    AlreadyJoined,

    #[error("Withdrawn participants cannot rejoin a challenge")]
    RejoinAfterWithdrawal,

    #[error("Challenge is full ({0} participants)")]
    ChallengeFull(u32),

    #[error("Challenge has ended")]
    ChallengeEnded,

    /// Optimistic update kept losing against concurrent writers.
    #[error("Update conflict on participant {0}")]
    Conflict(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_message() {
        let err = EngineError::Validation("missing distance_km".to_string());
        assert!(err.to_string().contains("missing distance_km"));
    }

    #[test]
    fn test_storage_error_converts() {
        let err: EngineError = DatabaseError::QueryFailed("boom".to_string()).into();
        assert!(matches!(err, EngineError::Storage(_)));
    }
}
