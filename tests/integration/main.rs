//! Integration test modules.

mod concurrency_test;
mod harness;
mod replay_test;
mod scenario_test;
