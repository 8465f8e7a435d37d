//! Shared fixtures for engine integration tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use crossbeam::channel::Receiver;
use fitquest::challenges::{Challenge, ChallengeType, NewChallenge, Privacy};
use fitquest::notifications::{ChannelSink, NotificationRequest};
use fitquest::{Database, EngineConfig, GamificationEngine, Workout, WorkoutType};
use uuid::Uuid;

/// Monday the challenges in these tests start on.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap()
}

pub fn engine_on(db: Arc<Database>) -> (Arc<GamificationEngine>, Receiver<NotificationRequest>) {
    let (sink, rx) = ChannelSink::new();
    (
        Arc::new(GamificationEngine::new(db, EngineConfig::default(), Arc::new(sink))),
        rx,
    )
}

pub fn in_memory_engine() -> (Arc<GamificationEngine>, Receiver<NotificationRequest>) {
    engine_on(Arc::new(Database::open_in_memory().unwrap()))
}

/// Create a challenge running from `start()` for two weeks, created the day before.
pub fn create_challenge(
    engine: &GamificationEngine,
    creator: Uuid,
    challenge_type: ChallengeType,
    target: f64,
) -> Challenge {
    let request = NewChallenge {
        creator_id: creator,
        name: "Spring Block".to_string(),
        description: Some("Two weeks".to_string()),
        challenge_type,
        target_value: target,
        start_date: start(),
        end_date: start() + Duration::days(14),
        privacy: Privacy::Public,
        invitees: Vec::new(),
    };
    engine
        .create_challenge(request, start() - Duration::days(1))
        .unwrap()
        .0
}

/// A run on day `day` of the challenge at a 6 min/km pace.
pub fn run(user: Uuid, day: i64, km: f64) -> Workout {
    Workout::new(
        user,
        WorkoutType::Running,
        start() + Duration::days(day) + Duration::hours(7),
        km * 6.0,
        km,
    )
}

/// Processing time shortly after the workout on `day`.
pub fn after(day: i64) -> DateTime<Utc> {
    start() + Duration::days(day) + Duration::hours(9)
}
