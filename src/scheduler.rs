//! Periodic challenge lifecycle sweep.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;

use crate::engine::GamificationEngine;

/// Run `advance_challenges` every `period` until `shutdown` resolves.
///
/// Each sweep runs on the blocking pool since the engine talks to SQLite
/// synchronously. Returns the number of completed sweeps.
pub async fn run_sweeper<F>(engine: Arc<GamificationEngine>, period: Duration, shutdown: F) -> u64
where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    tracing::info!("Challenge sweeper started ({:?} interval)", period);

    let mut sweeps = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Challenge sweeper stopping after {} sweeps", sweeps);
                break;
            }
            _ = ticker.tick() => {
                let engine = Arc::clone(&engine);
                match tokio::task::spawn_blocking(move || engine.advance_challenges(Utc::now())).await {
                    Ok(Ok(report)) => {
                        for failure in &report.failures {
                            tracing::warn!(
                                challenge_id = %failure.challenge_id,
                                "Sweep left challenge unchanged: {}",
                                failure.error
                            );
                        }
                    }
                    Ok(Err(e)) => tracing::warn!("Challenge sweep failed: {}", e),
                    Err(e) => tracing::error!("Challenge sweep task panicked: {}", e),
                }
                sweeps += 1;
            }
        }
    }

    sweeps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenges::{ChallengeStatus, ChallengeType, NewChallenge, Privacy};
    use crate::notifications::LogSink;
    use crate::storage::{Database, EngineConfig};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_sweeper_finalizes_ended_challenge() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let engine = Arc::new(GamificationEngine::new(
            db,
            EngineConfig::default(),
            Arc::new(LogSink),
        ));

        let created_at = Utc::now() - chrono::Duration::days(10);
        let request = NewChallenge {
            creator_id: Uuid::new_v4(),
            name: "Past week".to_string(),
            description: None,
            challenge_type: ChallengeType::ConsecutiveDays,
            target_value: 5.0,
            start_date: created_at + chrono::Duration::days(1),
            end_date: created_at + chrono::Duration::days(8),
            privacy: Privacy::Public,
            invitees: Vec::new(),
        };
        let (challenge, _) = engine.create_challenge(request, created_at).unwrap();

        let sweeps = run_sweeper(
            Arc::clone(&engine),
            Duration::from_millis(20),
            tokio::time::sleep(Duration::from_millis(150)),
        )
        .await;

        assert!(sweeps >= 1);
        assert_eq!(
            engine.challenge(challenge.id).unwrap().status,
            ChallengeStatus::Completed
        );
    }
}
