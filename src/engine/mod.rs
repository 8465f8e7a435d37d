//! Gamification engine.
//!
//! Runs achievement detection and challenge progress tracking for every
//! recorded workout, and drives the time-based challenge lifecycle.
//!
//! Every step is safe to replay: processed workouts are remembered per
//! (user, workout id), achievements are unique per (user, milestone), and a
//! workout is counted at most once per participant.

pub mod locks;
mod sweep;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::achievements::{detect, Achievement, DetectionInput};
use crate::challenges::lifecycle::{check_join, withdraw};
use crate::challenges::tracker::apply_to_participant;
use crate::challenges::{Challenge, ChallengeStatus, NewChallenge, Participant};
use crate::error::{EngineError, EngineResult};
use crate::leaderboards::{rank, Leaderboard};
use crate::notifications::milestones::{next_milestone_marker, rank_changes};
use crate::notifications::{
    on_progress_change, NotificationKind, NotificationRequest, NotificationSink, ProgressState,
};
use crate::storage::{
    storage_time, AchievementStore, ChallengeStore, Database, EngineConfig, ProgressWrite,
    WorkoutLedger,
};
use crate::workouts::Workout;

use locks::{lock, UserLocks};

pub use sweep::SweepReport;

/// A challenge whose update failed while processing a workout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeFailure {
    pub challenge_id: Uuid,
    pub error: String,
}

/// An achievement that was detected but could not be stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementFailure {
    pub dedup_key: String,
    pub error: String,
}

/// Result of processing one workout.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkoutOutcome {
    pub workout_id: Uuid,
    /// The workout was already fully processed; nothing was done
    pub replayed: bool,
    /// Newly unlocked achievements
    pub achievements: Vec<Achievement>,
    /// Participants whose progress changed
    pub updated_participants: Vec<Participant>,
    /// Notifications handed to the sink
    pub notifications: Vec<NotificationRequest>,
    pub achievement_failures: Vec<AchievementFailure>,
    pub failures: Vec<ChallengeFailure>,
}

impl WorkoutOutcome {
    fn new(workout_id: Uuid) -> Self {
        Self {
            workout_id,
            ..Default::default()
        }
    }

    /// Whether every achievement write and challenge update succeeded.
    pub fn is_complete(&self) -> bool {
        self.achievement_failures.is_empty() && self.failures.is_empty()
    }
}

/// Gamification engine shared across worker threads.
pub struct GamificationEngine {
    db: Arc<Database>,
    config: EngineConfig,
    sink: Arc<dyn NotificationSink>,
    user_locks: UserLocks,
}

impl GamificationEngine {
    /// Create an engine over an opened database.
    pub fn new(db: Arc<Database>, config: EngineConfig, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            db,
            config,
            sink,
            user_locks: UserLocks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========== Workout Processing ==========

    /// Process a newly recorded workout.
    ///
    /// Invalid workouts are rejected before anything is written. A failure
    /// in one challenge is logged and reported in the outcome without
    /// affecting the others; the workout then stays unprocessed so a retried
    /// event can finish the remaining work.
    pub fn record_workout(&self, mut workout: Workout, now: DateTime<Utc>) -> EngineResult<WorkoutOutcome> {
        workout.validate()?;
        workout.start_time = storage_time(workout.start_time);
        let now = storage_time(now);

        let handle = self.user_locks.handle(workout.user_id);
        let _serialized = lock(&*handle);

        let mut outcome = WorkoutOutcome::new(workout.id);

        let (history, unlocked, memberships) = {
            let conn = self.db.connection();
            if AchievementStore::new(&conn).is_processed(workout.user_id, workout.id)? {
                tracing::debug!(
                    user_id = %workout.user_id,
                    workout_id = %workout.id,
                    "Workout already processed"
                );
                outcome.replayed = true;
                return Ok(outcome);
            }

            let ledger = WorkoutLedger::new(&conn);
            ledger.insert_workout(&workout)?;
            (
                ledger.history_for_user(workout.user_id)?,
                AchievementStore::new(&conn).unlocked_keys(workout.user_id)?,
                ChallengeStore::new(&conn).challenges_for_user(workout.user_id)?,
            )
        };

        let input = DetectionInput {
            history: &history,
            new_workout: &workout,
            unlocked: &unlocked,
        };
        for achievement in detect(&input)? {
            let inserted = {
                let conn = self.db.connection();
                AchievementStore::new(&conn).insert_achievement(&achievement)
            };
            match inserted {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::warn!(
                        user_id = %achievement.user_id,
                        workout_id = %workout.id,
                        achievement = %achievement.dedup_key(),
                        "Achievement write failed: {}",
                        e
                    );
                    outcome.achievement_failures.push(AchievementFailure {
                        dedup_key: achievement.dedup_key(),
                        error: e.to_string(),
                    });
                    continue;
                }
            }

            tracing::info!(
                user_id = %achievement.user_id,
                achievement = %achievement.dedup_key(),
                tier = achievement.tier.as_str(),
                "Achievement unlocked"
            );
            outcome.notifications.push(NotificationRequest::new(
                achievement.user_id,
                None,
                NotificationKind::AchievementUnlocked {
                    achievement: achievement.kind.clone(),
                    tier: achievement.tier,
                    title: achievement.kind.title(),
                },
            ));
            outcome.achievements.push(achievement);
        }

        for (challenge, _) in &memberships {
            match self.apply_to_challenge(&workout, &history, challenge.id, now) {
                Ok(Some((participant, requests))) => {
                    outcome.updated_participants.push(participant);
                    outcome.notifications.extend(requests);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        challenge_id = %challenge.id,
                        user_id = %workout.user_id,
                        workout_id = %workout.id,
                        "Challenge progress update failed: {}",
                        e
                    );
                    outcome.failures.push(ChallengeFailure {
                        challenge_id: challenge.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        if outcome.is_complete() {
            let conn = self.db.connection();
            AchievementStore::new(&conn).mark_processed(workout.user_id, workout.id, now)?;
        }

        for request in &outcome.notifications {
            self.sink.deliver(request.clone());
        }

        tracing::debug!(
            workout_id = %workout.id,
            achievements = outcome.achievements.len(),
            challenges = outcome.updated_participants.len(),
            failures = outcome.achievement_failures.len() + outcome.failures.len(),
            "Workout processed"
        );

        Ok(outcome)
    }

    /// Apply one workout to one challenge, retrying on version conflicts.
    ///
    /// Returns the updated participant and the notifications its change
    /// caused, or `None` when the workout does not apply.
    fn apply_to_challenge(
        &self,
        workout: &Workout,
        history: &[Workout],
        challenge_id: Uuid,
        now: DateTime<Utc>,
    ) -> EngineResult<Option<(Participant, Vec<NotificationRequest>)>> {
        let attempts = self.config.processing.max_update_retries.max(1);
        let mut contended = challenge_id;

        for attempt in 1..=attempts {
            let (challenge, participants) = self.challenge_snapshot(challenge_id)?;
            let current = participants
                .iter()
                .find(|p| p.user_id == workout.user_id)
                .cloned()
                .ok_or(EngineError::NotJoined {
                    challenge_id,
                    user_id: workout.user_id,
                })?;
            contended = current.id;

            let Some(mut updated) = apply_to_participant(workout, history, &challenge, &current, now)?
            else {
                return Ok(None);
            };
            updated.last_milestone_notified = next_milestone_marker(
                current.completion_percentage,
                updated.completion_percentage,
                current.last_milestone_notified,
            );

            let write = {
                let conn = self.db.connection();
                ChallengeStore::new(&conn).write_progress(&updated, current.version, workout.id)?
            };

            match write {
                ProgressWrite::Applied => {
                    updated.version = current.version + 1;
                    let before = rank(&participants, None);
                    let (_, after_participants) = self.challenge_snapshot(challenge_id)?;
                    let after = rank(&after_participants, None);

                    let old_state = ProgressState {
                        user_id: current.user_id,
                        challenge_id,
                        completion_percentage: current.completion_percentage,
                        rank: before.rank_of(current.user_id),
                        last_milestone_notified: current.last_milestone_notified,
                    };
                    let new_state = ProgressState {
                        completion_percentage: updated.completion_percentage,
                        rank: after.rank_of(current.user_id),
                        last_milestone_notified: updated.last_milestone_notified,
                        ..old_state
                    };

                    let mut requests = on_progress_change(&old_state, &new_state);
                    requests.extend(rank_changes(challenge_id, &before, &after, current.user_id));

                    tracing::debug!(
                        challenge_id = %challenge_id,
                        participant_id = %updated.id,
                        progress = updated.current_progress,
                        completion = updated.completion_percentage,
                        "Participant progress updated"
                    );
                    return Ok(Some((updated, requests)));
                }
                ProgressWrite::AlreadyApplied => {
                    tracing::debug!(
                        challenge_id = %challenge_id,
                        workout_id = %workout.id,
                        "Workout already counted for challenge"
                    );
                    return Ok(None);
                }
                ProgressWrite::Conflict => {
                    tracing::debug!(
                        challenge_id = %challenge_id,
                        participant_id = %current.id,
                        attempt,
                        "Participant version conflict, retrying"
                    );
                }
            }
        }

        Err(EngineError::Conflict(contended))
    }

    /// Read a challenge and its participants under one lock.
    fn challenge_snapshot(&self, challenge_id: Uuid) -> EngineResult<(Challenge, Vec<Participant>)> {
        let conn = self.db.connection();
        let store = ChallengeStore::new(&conn);
        let challenge = store
            .get_challenge(challenge_id)?
            .ok_or(EngineError::ChallengeNotFound(challenge_id))?;
        let participants = store.participants(challenge_id)?;
        Ok((challenge, participants))
    }

    // ========== Challenges ==========

    /// Create a challenge and auto-join its creator.
    ///
    /// Invitees are only counted against the invitation limit; delivering
    /// the invitations is left to the caller.
    pub fn create_challenge(
        &self,
        request: NewChallenge,
        now: DateTime<Utc>,
    ) -> EngineResult<(Challenge, Participant)> {
        request.validate(&self.config.challenges)?;
        if request.end_date <= now {
            return Err(EngineError::Validation(
                "challenge end date is in the past".to_string(),
            ));
        }

        let now = storage_time(now);
        let mut challenge = request.into_challenge(now);
        challenge.start_date = storage_time(challenge.start_date);
        challenge.end_date = storage_time(challenge.end_date);
        let creator = Participant::new(challenge.id, challenge.creator_id, now);

        {
            let conn = self.db.connection();
            let store = ChallengeStore::new(&conn);
            store.insert_challenge(&challenge)?;
            store.insert_participant(&creator)?;
        }

        tracing::info!(
            challenge_id = %challenge.id,
            challenge_type = challenge.challenge_type.as_str(),
            status = %challenge.status,
            "Challenge created"
        );

        Ok((challenge, creator))
    }

    /// Join a challenge.
    pub fn join_challenge(
        &self,
        challenge_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> EngineResult<Participant> {
        let now = storage_time(now);
        // The count check and the insert share one connection lock.
        let conn = self.db.connection();
        let store = ChallengeStore::new(&conn);

        let challenge = store
            .get_challenge(challenge_id)?
            .ok_or(EngineError::ChallengeNotFound(challenge_id))?;
        let existing = store.get_participant(challenge_id, user_id)?;
        let count = store.participant_count(challenge_id)?;

        check_join(&challenge, existing.as_ref(), count, &self.config.challenges, now)?;

        let participant = Participant::new(challenge_id, user_id, now);
        store.insert_participant(&participant)?;

        tracing::info!(
            challenge_id = %challenge_id,
            user_id = %user_id,
            participants = count + 1,
            "Joined challenge"
        );

        Ok(participant)
    }

    /// Withdraw from a challenge. Returns false if already withdrawn.
    pub fn withdraw(&self, challenge_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> EngineResult<bool> {
        let conn = self.db.connection();
        let store = ChallengeStore::new(&conn);

        let challenge = store
            .get_challenge(challenge_id)?
            .ok_or(EngineError::ChallengeNotFound(challenge_id))?;
        let mut participant = store
            .get_participant(challenge_id, user_id)?
            .ok_or(EngineError::NotJoined {
                challenge_id,
                user_id,
            })?;

        if challenge.status_at(now) == ChallengeStatus::Completed {
            return Err(EngineError::ChallengeEnded);
        }
        if !withdraw(&mut participant, now) {
            return Ok(false);
        }

        let withdrawn = store.withdraw_participant(challenge_id, user_id, now)?;
        if withdrawn {
            tracing::info!(challenge_id = %challenge_id, user_id = %user_id, "Withdrew from challenge");
        }
        Ok(withdrawn)
    }

    /// Current standings of a challenge.
    pub fn leaderboard(&self, challenge_id: Uuid, viewer: Option<Uuid>) -> EngineResult<Leaderboard> {
        let (_, participants) = self.challenge_snapshot(challenge_id)?;
        Ok(rank(&participants, viewer))
    }

    /// Look up a challenge.
    pub fn challenge(&self, challenge_id: Uuid) -> EngineResult<Challenge> {
        let conn = self.db.connection();
        ChallengeStore::new(&conn)
            .get_challenge(challenge_id)?
            .ok_or(EngineError::ChallengeNotFound(challenge_id))
    }

    /// A user's participant record, withdrawn ones included.
    pub fn participant(&self, challenge_id: Uuid, user_id: Uuid) -> EngineResult<Participant> {
        let conn = self.db.connection();
        ChallengeStore::new(&conn)
            .get_participant(challenge_id, user_id)?
            .ok_or(EngineError::NotJoined {
                challenge_id,
                user_id,
            })
    }

    /// Achievements a user holds, most recent first.
    pub fn achievements(&self, user_id: Uuid) -> EngineResult<Vec<Achievement>> {
        let conn = self.db.connection();
        Ok(AchievementStore::new(&conn).achievements_for_user(user_id)?)
    }
}
