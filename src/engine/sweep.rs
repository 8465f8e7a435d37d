//! Time-driven challenge lifecycle: activation and finalization.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{ChallengeFailure, GamificationEngine};
use crate::badges::{finalize, Finalization};
use crate::challenges::{Challenge, ChallengeStatus};
use crate::error::{EngineError, EngineResult};
use crate::notifications::{NotificationKind, NotificationRequest};
use crate::storage::ChallengeStore;

/// What one sweep changed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub activated: Vec<Uuid>,
    pub finalized: Vec<Uuid>,
    pub failures: Vec<ChallengeFailure>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.activated.is_empty() && self.finalized.is_empty() && self.failures.is_empty()
    }
}

impl GamificationEngine {
    /// Move every unfinalized challenge forward to the status implied by `now`.
    ///
    /// Safe to run from several workers at once: each finalization is claimed
    /// by exactly one of them.
    pub fn advance_challenges(&self, now: DateTime<Utc>) -> EngineResult<SweepReport> {
        let pending = {
            let conn = self.db.connection();
            ChallengeStore::new(&conn).pending_challenges()?
        };

        let mut report = SweepReport::default();
        for challenge in pending {
            let mut target = challenge.clone();
            if !target.advance(now) {
                continue;
            }

            let result = match target.status {
                ChallengeStatus::Active => self.activate(&challenge).map(|activated| {
                    if activated {
                        report.activated.push(challenge.id);
                    }
                }),
                ChallengeStatus::Completed => {
                    self.finalize_challenge(challenge.id, now).map(|finalization| {
                        if finalization.is_some() {
                            report.finalized.push(challenge.id);
                        }
                    })
                }
                ChallengeStatus::Upcoming => Ok(()),
            };

            if let Err(e) = result {
                tracing::warn!(challenge_id = %challenge.id, "Challenge lifecycle step failed: {}", e);
                report.failures.push(ChallengeFailure {
                    challenge_id: challenge.id,
                    error: e.to_string(),
                });
            }
        }

        if !report.is_empty() {
            tracing::info!(
                activated = report.activated.len(),
                finalized = report.finalized.len(),
                failures = report.failures.len(),
                "Challenge sweep finished"
            );
        }

        Ok(report)
    }

    fn activate(&self, challenge: &Challenge) -> EngineResult<bool> {
        let conn = self.db.connection();
        let activated = ChallengeStore::new(&conn).activate_challenge(challenge.id)?;
        if activated {
            tracing::info!(challenge_id = %challenge.id, "Challenge started");
        }
        Ok(activated)
    }

    /// Finalize an ended challenge and award its badges.
    ///
    /// Returns `None` if the challenge has not ended yet or another caller
    /// already finalized it.
    pub fn finalize_challenge(
        &self,
        challenge_id: Uuid,
        now: DateTime<Utc>,
    ) -> EngineResult<Option<Finalization>> {
        let claimed = {
            let conn = self.db.connection();
            let store = ChallengeStore::new(&conn);
            let challenge = store
                .get_challenge(challenge_id)?
                .ok_or(EngineError::ChallengeNotFound(challenge_id))?;

            if now < challenge.end_date || challenge.status == ChallengeStatus::Completed {
                return Ok(None);
            }

            // A challenge that ended before any sweep saw it start.
            store.activate_challenge(challenge_id)?;
            store.claim_completion(challenge_id, now, |participants| {
                finalize(&challenge, participants, now)
            })?
        };

        let Some(finalization) = claimed else {
            tracing::debug!(challenge_id = %challenge_id, "Challenge already finalized");
            return Ok(None);
        };

        for entry in &finalization.leaderboard.entries {
            self.sink.deliver(NotificationRequest::new(
                entry.user_id,
                Some(challenge_id),
                NotificationKind::ChallengeCompleted {
                    final_rank: Some(entry.rank),
                    completion_percentage: entry.completion_percentage,
                },
            ));
        }
        for award in &finalization.awards {
            self.sink.deliver(NotificationRequest::new(
                award.user_id,
                Some(challenge_id),
                NotificationKind::BadgeAwarded {
                    badge: award.badge,
                    final_rank: Some(award.final_rank),
                },
            ));
        }

        tracing::info!(
            challenge_id = %challenge_id,
            participants = finalization.leaderboard.len(),
            badges = finalization.awards.len(),
            "Challenge finalized"
        );

        Ok(Some(finalization))
    }
}
