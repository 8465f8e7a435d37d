//! Leaderboards module
//!
//! Derives challenge standings from participant records.

pub mod rankings;

pub use rankings::{rank, Leaderboard, LeaderboardEntry};
