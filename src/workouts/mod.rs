//! Workout records consumed by the engine.

pub mod streaks;
pub mod types;

pub use types::{Workout, WorkoutType};
