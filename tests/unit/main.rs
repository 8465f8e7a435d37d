//! Unit test modules.

mod achievement_catalogue_test;
mod leaderboard_test;
mod milestone_test;
