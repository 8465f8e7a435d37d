//! Storage module for database and configuration.

pub mod achievement_store;
pub mod challenge_store;
pub mod config;
pub mod database;
pub mod schema;
pub mod workout_store;

pub use achievement_store::AchievementStore;
pub use challenge_store::{ChallengeStore, ProgressWrite};
pub use config::{ChallengeSettings, EngineConfig};
pub use database::{storage_time, Database, DatabaseError};
pub use workout_store::WorkoutLedger;
