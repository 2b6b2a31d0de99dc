//! Project operations: multi-step goals, their subtasks, and the
//! append-and-recompute progress flow.
//!
//! The progress log is append-only; every append is followed by a full
//! recompute of that day's status (see [`aggregate`]). Validation happens
//! before any write, and multi-row writes are single transactions.

pub mod aggregate;
pub mod dashboard;

pub use aggregate::{recompute_daily_status, CompletionHook, LogCompletionHook};
pub use dashboard::project_dashboard;

use crate::db::{repo::new_id, Database};
use crate::error::{require_owner, Error, Result};
use crate::types::*;
use crate::{day, decimal};
use chrono::Utc;
use rust_decimal::Decimal;

const MAX_NAME_LEN: usize = 255;
const MAX_SUBTASK_NAME_LEN: usize = 100;
const MAX_UNIT_LEN: usize = 20;
const MAX_NOTE_LEN: usize = 500;

fn validate_subtask_input(input: &SubtaskInput) -> Result<()> {
    if input.name.trim().is_empty() || input.name.len() > MAX_SUBTASK_NAME_LEN {
        return Err(Error::Validation(format!(
            "subtask name must be 1-{MAX_SUBTASK_NAME_LEN} characters"
        )));
    }
    if input.target <= Decimal::ZERO {
        return Err(Error::Validation(format!(
            "subtask target must be positive, got {}",
            input.target
        )));
    }
    if let Some(unit) = &input.unit {
        if unit.len() > MAX_UNIT_LEN {
            return Err(Error::Validation("subtask unit too long".into()));
        }
    }
    Ok(())
}

fn validate_project_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.len() > MAX_NAME_LEN {
        return Err(Error::Validation(format!(
            "project name must be 1-{MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Create a project together with its initial subtasks, atomically.
///
/// A project must start with at least one subtask; every target must be
/// positive. Nothing is written when validation fails.
pub fn create_project(db: &Database, owner_id: &str, input: &NewProject) -> Result<(Project, Vec<Subtask>)> {
    require_owner(owner_id)?;
    validate_project_name(&input.name)?;
    if input.subtasks.is_empty() {
        return Err(Error::Validation(
            "project must have at least one subtask".into(),
        ));
    }
    for subtask in &input.subtasks {
        validate_subtask_input(subtask)?;
    }

    let project = Project {
        id: new_id(),
        owner_id: owner_id.to_string(),
        name: input.name.trim().to_string(),
        emoji: input.emoji.clone(),
        description: input.description.clone(),
        progress_required: input.progress_required,
        created_at: Utc::now(),
    };
    let subtasks = db.create_project_with_subtasks(&project, &input.subtasks)?;

    tracing::info!(project_id = %project.id, subtasks = subtasks.len(), "Created project");
    Ok((project, subtasks))
}

/// Replace a project's subtask set in one atomic unit.
///
/// Inputs with an id update that subtask, inputs without one create a new
/// subtask, and stored subtasks missing from the input set are deleted
/// (their historical progress-log entries stay stored and simply stop
/// contributing to recomputation).
pub fn replace_subtasks(
    db: &Database,
    owner_id: &str,
    project_id: &str,
    inputs: &[SubtaskInput],
) -> Result<Vec<Subtask>> {
    require_owner(owner_id)?;
    let project = db.get_project_owned(owner_id, project_id)?;
    for input in inputs {
        validate_subtask_input(input)?;
    }

    db.replace_subtasks(&project.id, inputs)?;
    db.list_subtasks(&project.id)
}

/// Delete a project and everything hanging off it.
pub fn delete_project(db: &Database, owner_id: &str, project_id: &str) -> Result<()> {
    require_owner(owner_id)?;
    db.delete_project(owner_id, project_id)?;
    tracing::info!(project_id, "Deleted project");
    Ok(())
}

/// Append one progress-log entry and recompute that day's status.
///
/// The entry is bucketed into the local day containing `input.at` (in
/// `input.timezone`, host-local when absent or unrecognized). The append
/// is durable first; the recompute then re-folds the whole day, so it
/// observes at least this append. Returns the freshly persisted totals and
/// completion flag.
pub fn log_progress(
    db: &Database,
    owner_id: &str,
    input: &LogProgressInput,
    hook: &dyn CompletionHook,
) -> Result<LogOutcome> {
    require_owner(owner_id)?;
    if let Some(note) = &input.note {
        if note.len() > MAX_NOTE_LEN {
            return Err(Error::Validation("note too long".into()));
        }
    }

    let project = db.get_project_owned(owner_id, &input.project_id)?;
    let subtask = db.get_subtask_in_project(&project.id, &input.subtask_id)?;

    let bucket = day::day_key(input.at, input.timezone.as_deref());
    db.insert_progress_log(&ProgressLogEntry {
        id: 0,
        project_id: project.id.clone(),
        subtask_id: subtask.id.clone(),
        day: bucket.clone(),
        delta: input.delta,
        note: input.note.clone(),
        created_at: Utc::now(),
    })?;

    tracing::debug!(
        project_id = %project.id,
        subtask_id = %subtask.id,
        day = %bucket,
        delta = %input.delta,
        "Appended progress entry"
    );

    let status = aggregate::recompute_daily_status(db, owner_id, &project.id, &bucket, hook)?;
    Ok(LogOutcome {
        day: bucket,
        totals: status.totals,
        is_completed: status.is_completed,
    })
}

/// Convenience for callers holding a float delta: validates finiteness
/// before it can reach the log.
pub fn delta_from_f64(value: f64) -> Result<Decimal> {
    decimal::from_f64(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use std::str::FromStr;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
    }

    fn subtask_input(name: &str, target: &str) -> SubtaskInput {
        SubtaskInput {
            id: None,
            name: name.to_string(),
            target: Decimal::from_str(target).unwrap(),
            unit: None,
            order: None,
        }
    }

    fn new_project(subtasks: Vec<SubtaskInput>) -> NewProject {
        NewProject {
            name: "Write a book".to_string(),
            emoji: Some("📖".to_string()),
            description: None,
            progress_required: true,
            subtasks,
        }
    }

    #[test]
    fn test_create_rejects_empty_subtasks() {
        let db = test_db();
        assert!(matches!(
            create_project(&db, "u1", &new_project(vec![])),
            Err(Error::Validation(_))
        ));
        // Nothing was written
        assert!(db.list_projects("u1").unwrap().is_empty());
    }

    #[test]
    fn test_create_rejects_non_positive_target() {
        let db = test_db();
        for bad in ["0", "-5"] {
            assert!(matches!(
                create_project(&db, "u1", &new_project(vec![subtask_input("pages", bad)])),
                Err(Error::Validation(_))
            ));
        }
        assert!(db.list_projects("u1").unwrap().is_empty());
    }

    #[test]
    fn test_create_assigns_order_by_position() {
        let db = test_db();
        let (_, subtasks) = create_project(
            &db,
            "u1",
            &new_project(vec![subtask_input("a", "1"), subtask_input("b", "2")]),
        )
        .unwrap();
        assert_eq!(subtasks[0].order, 0);
        assert_eq!(subtasks[1].order, 1);
    }

    #[test]
    fn test_log_progress_appends_and_recomputes() {
        let db = test_db();
        let hook = LogCompletionHook;
        let (project, subtasks) = create_project(
            &db,
            "u1",
            &new_project(vec![subtask_input("pages", "10")]),
        )
        .unwrap();

        let outcome = log_progress(
            &db,
            "u1",
            &LogProgressInput {
                project_id: project.id.clone(),
                subtask_id: subtasks[0].id.clone(),
                delta: Decimal::from_str("4.5").unwrap(),
                note: Some("morning session".to_string()),
                at: at(),
                timezone: Some("UTC".to_string()),
            },
            &hook,
        )
        .unwrap();

        assert_eq!(outcome.day, "2025-06-10");
        assert_eq!(outcome.totals[&subtasks[0].id], "4.5");
        assert!(!outcome.is_completed);

        // The persisted status matches what the caller saw
        let stored = db.get_daily_status(&project.id, "2025-06-10").unwrap().unwrap();
        assert_eq!(stored.totals, outcome.totals);
    }

    #[test]
    fn test_log_progress_rejects_foreign_subtask() {
        let db = test_db();
        let hook = LogCompletionHook;
        let (mine, _) = create_project(&db, "u1", &new_project(vec![subtask_input("a", "1")]))
            .unwrap();
        let (_, other_subtasks) =
            create_project(&db, "u2", &new_project(vec![subtask_input("b", "1")])).unwrap();

        // A subtask from someone else's project does not resolve, even with
        // a project id the caller does own
        let result = log_progress(
            &db,
            "u1",
            &LogProgressInput {
                project_id: mine.id.clone(),
                subtask_id: other_subtasks[0].id.clone(),
                delta: Decimal::ONE,
                note: None,
                at: at(),
                timezone: Some("UTC".to_string()),
            },
            &hook,
        );
        assert!(matches!(result, Err(Error::NotFoundOrAccessDenied("subtask"))));

        // And no log entry leaked through
        assert!(db.progress_logs_for_day(&mine.id, "2025-06-10").unwrap().is_empty());
    }

    #[test]
    fn test_delta_from_f64_guards_the_log() {
        assert!(delta_from_f64(2.5).is_ok());
        assert!(delta_from_f64(f64::NAN).is_err());
    }

    #[test]
    fn test_replace_subtasks_validates_before_writing() {
        let db = test_db();
        let (project, subtasks) =
            create_project(&db, "u1", &new_project(vec![subtask_input("a", "1")])).unwrap();

        let result = replace_subtasks(
            &db,
            "u1",
            &project.id,
            &[subtask_input("bad", "0")],
        );
        assert!(matches!(result, Err(Error::Validation(_))));

        // The original subtask is untouched
        let stored = db.list_subtasks(&project.id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, subtasks[0].id);
    }
}
