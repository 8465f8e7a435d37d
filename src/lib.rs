//! FitQuest - Fitness Gamification Engine
//!
//! Decides which achievements a recorded workout unlocks, tracks progress in
//! multi-user challenges, ranks participants, emits milestone notifications,
//! and awards badges when challenges end.

pub mod achievements;
pub mod badges;
pub mod challenges;
pub mod engine;
pub mod error;
pub mod leaderboards;
pub mod notifications;
pub mod scheduler;
pub mod storage;
pub mod workouts;

// Re-export commonly used types
pub use engine::{GamificationEngine, SweepReport, WorkoutOutcome};
pub use error::{EngineError, EngineResult};
pub use storage::{Database, EngineConfig};
pub use workouts::{Workout, WorkoutType};
