//! Activity operations: counter-style habits and their read-side summaries.
//!
//! Every operation re-verifies that the activity belongs to the caller
//! before touching it, and validates input before any write.

use crate::db::{repo::new_id, Database};
use crate::error::{require_owner, Error, Result};
use crate::types::*;
use crate::{day, streak};
use chrono::{DateTime, Utc};

fn validate_activity(data: &NewActivity) -> Result<()> {
    if data.name.trim().is_empty() {
        return Err(Error::Validation("activity name must not be empty".into()));
    }
    if data.name.len() > 255 {
        return Err(Error::Validation("activity name too long".into()));
    }
    Ok(())
}

/// Create a new activity for the caller.
pub fn create_activity(db: &Database, owner_id: &str, data: &NewActivity) -> Result<Activity> {
    require_owner(owner_id)?;
    validate_activity(data)?;

    let activity = Activity {
        id: new_id(),
        owner_id: owner_id.to_string(),
        name: data.name.trim().to_string(),
        emoji: data.emoji.clone(),
        description: data.description.clone(),
        created_at: Utc::now(),
    };
    db.insert_activity(&activity)?;

    tracing::info!(activity_id = %activity.id, "Created activity");
    Ok(activity)
}

/// Rename or re-describe an activity.
pub fn update_activity(
    db: &Database,
    owner_id: &str,
    activity_id: &str,
    data: &NewActivity,
) -> Result<()> {
    require_owner(owner_id)?;
    validate_activity(data)?;
    db.update_activity(owner_id, activity_id, data)
}

/// Delete an activity; its log rows cascade with it.
pub fn delete_activity(db: &Database, owner_id: &str, activity_id: &str) -> Result<()> {
    require_owner(owner_id)?;
    db.delete_activity(owner_id, activity_id)?;
    tracing::info!(activity_id, "Deleted activity");
    Ok(())
}

/// Record one completion of an activity at the given instant.
///
/// The instant is bucketed into the caller's local day; the first
/// completion of a day creates the log row at count 1, later ones bump it.
/// Returns the new count and the streak including this completion.
pub fn increment_activity(
    db: &Database,
    owner_id: &str,
    activity_id: &str,
    at: DateTime<Utc>,
    tz: Option<&str>,
) -> Result<IncrementOutcome> {
    require_owner(owner_id)?;
    let activity = db.get_activity_owned(owner_id, activity_id)?;

    let bucket = day::day_key(at, tz);
    let count = db.increment_activity_log(&activity.id, owner_id, &bucket, Utc::now())?;
    let streaks = streak::activity_streaks(db, owner_id, &activity.id, day::local_date(at, tz))?;

    tracing::debug!(activity_id, day = %bucket, count, "Recorded completion");
    Ok(IncrementOutcome {
        day: bucket,
        count,
        current_streak: streaks.current,
    })
}

/// Undo the most recent completion for the day containing `at`.
///
/// The count never goes below zero, and a count of zero is stored as the
/// absence of the row.
pub fn undo_increment(
    db: &Database,
    owner_id: &str,
    activity_id: &str,
    at: DateTime<Utc>,
    tz: Option<&str>,
) -> Result<()> {
    require_owner(owner_id)?;
    let activity = db.get_activity_owned(owner_id, activity_id)?;

    let bucket = day::day_key(at, tz);
    db.decrement_activity_log(&activity.id, owner_id, &bucket)
}

/// List the caller's activities with their derived read-side fields for
/// the day containing `at`.
pub fn list_activities(
    db: &Database,
    owner_id: &str,
    at: DateTime<Utc>,
    tz: Option<&str>,
) -> Result<Vec<ActivitySummary>> {
    require_owner(owner_id)?;

    let today = day::local_date(at, tz);
    let key = day::format_day(today);
    let rows = db.list_activities_with_counts(owner_id, &key)?;

    let mut summaries = Vec::with_capacity(rows.len());
    for (activity, today_count, total_days) in rows {
        let streaks = streak::activity_streaks(db, owner_id, &activity.id, today)?;
        summaries.push(ActivitySummary {
            activity,
            today_count,
            total_days,
            current_streak: streaks.current,
            best_streak: streaks.best,
        });
    }
    Ok(summaries)
}

/// Whole-day rollup across the caller's activities.
pub fn today_summary(
    db: &Database,
    owner_id: &str,
    at: DateTime<Utc>,
    tz: Option<&str>,
) -> Result<TodaySummary> {
    require_owner(owner_id)?;
    let key = day::day_key(at, tz);
    db.day_totals(owner_id, &key)
}
