//! Consecutive-day run calculations.
//!
//! All functions work on calendar dates; several workouts on the same day
//! count once.

use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Length of the consecutive-day run that ends exactly on `day`.
///
/// Returns 0 if there is no workout on `day`.
pub fn run_ending_at(dates: &BTreeSet<NaiveDate>, day: NaiveDate) -> u32 {
    let mut run = 0;
    let mut cursor = day;
    while dates.contains(&cursor) {
        run += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    run
}

/// Run ending on the most recent date in the set.
pub fn latest_run(dates: &BTreeSet<NaiveDate>) -> u32 {
    dates
        .iter()
        .next_back()
        .map(|&last| run_ending_at(dates, last))
        .unwrap_or(0)
}
