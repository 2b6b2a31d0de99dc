//! Streak calculation for counter-style activities.
//!
//! Streaks are pure queries over the set of local days with a positive
//! count: nothing is persisted, and repeated calls over the same history
//! give the same answer. Gaps are defined on calendar dates, not on the
//! number of log entries in between.

use crate::db::Database;
use crate::error::{require_owner, Result};
use crate::types::StreakSummary;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Consecutive days with activity ending at `today`.
///
/// Walks backward one calendar day at a time and stops at the first gap;
/// a missing entry for `today` itself yields 0.
pub fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut cursor = today;
    while days.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    streak
}

/// Longest run of consecutive days ever observed.
///
/// Scans the history in chronological order; a day exactly one calendar
/// day after its predecessor extends the run, anything else resets it to 1.
pub fn best_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for &day in days {
        run = match prev {
            Some(p) if p.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(day);
    }
    best
}

/// Load an activity's positive-count day set (ownership-checked) and
/// compute both streaks for it.
pub fn activity_streaks(
    db: &Database,
    owner_id: &str,
    activity_id: &str,
    today: NaiveDate,
) -> Result<StreakSummary> {
    require_owner(owner_id)?;
    let activity = db.get_activity_owned(owner_id, activity_id)?;
    let days: BTreeSet<NaiveDate> = db.activity_days(&activity.id)?.into_iter().collect();
    Ok(StreakSummary {
        current: current_streak(&days, today),
        best: best_streak(&days),
    })
}
