//! Challenges: model, membership rules and progress tracking.

pub mod lifecycle;
pub mod tracker;
pub mod types;

pub use types::{
    Challenge, ChallengeStatus, ChallengeType, NewChallenge, Participant, ParticipantStatus,
    Privacy, ProgressMetric,
};
