//! Daily progress aggregation.
//!
//! The progress log is the source of truth; the daily status row is a
//! cache of a fold over it. Recomputation always re-folds the entire day's
//! log rather than maintaining a running counter, so concurrent appends
//! that race to recompute both converge on the same persisted state, and
//! re-running with an unchanged log reproduces the row exactly.

use crate::db::Database;
use crate::decimal;
use crate::error::{require_owner, Result};
use crate::types::{DailyStatus, Project};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Receiver for the not-completed -> completed transition of one
/// (project, day). Fire-and-forget: the core consumes no return value.
///
/// The transition is guarded only by the previously persisted status, not
/// by a separate "already notified" flag. A day that completes, dips below
/// target after a correcting negative delta, and completes again therefore
/// fires again; that flicker behavior is deliberate.
pub trait CompletionHook: Send + Sync {
    fn on_completed(&self, project_id: &str, day: &str, owner_id: &str);
}

/// Default hook: log the celebration and move on.
pub struct LogCompletionHook;

impl CompletionHook for LogCompletionHook {
    fn on_completed(&self, project_id: &str, day: &str, owner_id: &str) {
        tracing::info!(project_id, day, owner_id, "Project completed for the day");
    }
}

fn evaluate(project: &Project, subtasks: &[crate::types::Subtask], totals: &BTreeMap<String, Decimal>) -> bool {
    project.progress_required
        && !subtasks.is_empty()
        && subtasks
            .iter()
            .all(|s| decimal::gte(totals.get(&s.id).copied().unwrap_or(Decimal::ZERO), s.target))
}

/// Recompute and persist the daily status for one (project, day).
///
/// Loads the project (ownership-checked), folds every log entry of the day
/// into per-subtask exact totals, evaluates the completion predicate, and
/// upserts the result. Entries whose subtask has since been deleted stay in
/// the log but are not folded. When the persisted status flips from
/// not-completed to completed, the hook fires once.
pub fn recompute_daily_status(
    db: &Database,
    owner_id: &str,
    project_id: &str,
    day: &str,
    hook: &dyn CompletionHook,
) -> Result<DailyStatus> {
    require_owner(owner_id)?;
    let project = db.get_project_owned(owner_id, project_id)?;
    let subtasks = db.list_subtasks(&project.id)?;
    let logs = db.progress_logs_for_day(&project.id, day)?;

    let mut totals: BTreeMap<String, Decimal> = subtasks
        .iter()
        .map(|s| (s.id.clone(), Decimal::ZERO))
        .collect();

    // Fold order is irrelevant: exact addition is associative and
    // commutative at this precision
    for entry in &logs {
        if let Some(total) = totals.get_mut(&entry.subtask_id) {
            *total = decimal::add(*total, entry.delta);
        }
    }

    let is_completed = evaluate(&project, &subtasks, &totals);

    let prev_completed = db
        .get_daily_status(&project.id, day)?
        .map(|s| s.is_completed)
        .unwrap_or(false);

    let now = Utc::now();
    let status = DailyStatus {
        project_id: project.id.clone(),
        day: day.to_string(),
        totals: totals
            .iter()
            .map(|(id, total)| (id.clone(), total.to_string()))
            .collect(),
        is_completed,
        completed_at: is_completed.then_some(now),
        computed_at: now,
    };
    db.upsert_daily_status(&status)?;

    tracing::debug!(
        project_id,
        day,
        is_completed,
        entries = logs.len(),
        "Recomputed daily status"
    );

    if !prev_completed && is_completed {
        hook.on_completed(&project.id, day, owner_id);
    }

    Ok(status)
}
