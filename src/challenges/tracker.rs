//! Challenge progress tracking.
//!
//! Applies one workout to each challenge the user takes part in. Workouts
//! that do not apply (deleted, outside the window, wrong type, withdrawn
//! participant, inactive challenge) are skipped without error.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::types::{Challenge, ChallengeStatus, ChallengeType, Participant, ProgressMetric};
use crate::error::EngineResult;
use crate::workouts::streaks::latest_run;
use crate::workouts::Workout;

/// Compute the participant's new state after `workout`.
///
/// Returns `Ok(None)` when the workout does not apply. `history` is the
/// user's workout history and is only consulted for consecutive-days
/// challenges.
pub fn apply_to_participant(
    workout: &Workout,
    history: &[Workout],
    challenge: &Challenge,
    participant: &Participant,
    now: DateTime<Utc>,
) -> EngineResult<Option<Participant>> {
    workout.validate()?;

    if workout.deleted
        || !participant.is_active()
        || participant.user_id != workout.user_id
        || participant.challenge_id != challenge.id
        || challenge.status_at(now) != ChallengeStatus::Active
        || !challenge.challenge_type.accepts(workout.workout_type)
        || !challenge.contains(workout.start_time)
    {
        return Ok(None);
    }

    let progress = match challenge.challenge_type {
        ChallengeType::TotalDistance => participant.current_progress + workout.distance(),
        ChallengeType::TotalDuration => participant.current_progress + workout.duration(),
        ChallengeType::SpecificWorkoutType { metric, .. } => {
            participant.current_progress
                + match metric {
                    ProgressMetric::Distance => workout.distance(),
                    ProgressMetric::Duration => workout.duration(),
                }
        }
        ChallengeType::ConsecutiveDays => consecutive_days(workout, history, challenge) as f64,
    };

    let mut updated = participant.clone();
    updated.set_progress(progress, challenge);
    updated.updated_at = now;
    Ok(Some(updated))
}

/// Apply a workout to every (challenge, participant) pair of the user.
///
/// Returns only the participants that changed.
pub fn apply(
    workout: &Workout,
    history: &[Workout],
    challenges_for_user: &[(Challenge, Participant)],
    now: DateTime<Utc>,
) -> EngineResult<Vec<Participant>> {
    let mut updated = Vec::new();
    for (challenge, participant) in challenges_for_user {
        if let Some(p) = apply_to_participant(workout, history, challenge, participant, now)? {
            updated.push(p);
        }
    }
    Ok(updated)
}

/// Run length as of the latest active day inside the challenge window.
fn consecutive_days(workout: &Workout, history: &[Workout], challenge: &Challenge) -> u32 {
    let dates: BTreeSet<_> = history
        .iter()
        .filter(|w| !w.deleted && w.user_id == workout.user_id && challenge.contains(w.start_time))
        .map(|w| w.date())
        .chain(std::iter::once(workout.date()))
        .collect();
    latest_run(&dates)
}
