//! Achievement detection and catalogue.
//!
//! Each recorded workout is inspected against independent rules (first
//! workout, streaks, lifetime distance, workout count, personal records).

pub mod definitions;
pub mod detector;
pub mod types;

pub use detector::{detect, DetectionInput};
pub use types::{Achievement, AchievementKind, CelebrationTier, RecordKind};
