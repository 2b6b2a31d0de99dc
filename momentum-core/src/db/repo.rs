//! Database repository layer
//!
//! Query and insert operations for all entity types. Mutating and
//! aggregating callers go through the `*_owned` loaders, which re-verify
//! ownership on every call; an id that is absent and an id owned by
//! someone else are indistinguishable in the result.

use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

/// Generate a fresh entity id.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database.
    ///
    /// This is the provisioning step: invoke once at process startup,
    /// before handing the database to any operation.
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ============================================
    // Activity operations
    // ============================================

    /// Insert an activity
    pub fn insert_activity(&self, activity: &Activity) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO activities (id, owner_id, name, emoji, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                activity.id,
                activity.owner_id,
                activity.name,
                activity.emoji,
                activity.description,
                activity.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Update an activity's name/emoji/description, scoped to its owner
    pub fn update_activity(
        &self,
        owner_id: &str,
        activity_id: &str,
        data: &NewActivity,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            r#"
            UPDATE activities
            SET name = ?1, emoji = ?2, description = ?3
            WHERE id = ?4 AND owner_id = ?5
            "#,
            params![data.name, data.emoji, data.description, activity_id, owner_id],
        )?;
        if updated == 0 {
            return Err(Error::NotFoundOrAccessDenied("activity"));
        }
        Ok(())
    }

    /// Delete an activity; its log rows cascade
    pub fn delete_activity(&self, owner_id: &str, activity_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM activities WHERE id = ?1 AND owner_id = ?2",
            params![activity_id, owner_id],
        )?;
        if deleted == 0 {
            return Err(Error::NotFoundOrAccessDenied("activity"));
        }
        Ok(())
    }

    /// Load an activity, verifying it belongs to the caller
    pub fn get_activity_owned(&self, owner_id: &str, activity_id: &str) -> Result<Activity> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM activities WHERE id = ?1 AND owner_id = ?2",
            params![activity_id, owner_id],
            Self::row_to_activity,
        )
        .optional()?
        .ok_or(Error::NotFoundOrAccessDenied("activity"))
    }

    /// List a user's activities with per-day count and total active days.
    ///
    /// Returns `(activity, day_count, total_days)` tuples; streaks are
    /// computed by the caller from the activity's day set.
    pub fn list_activities_with_counts(
        &self,
        owner_id: &str,
        day: &str,
    ) -> Result<Vec<(Activity, i64, i64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT
                a.*,
                COALESCE(today_log.count, 0) AS day_count,
                COALESCE(total_stats.total_days, 0) AS total_days
            FROM activities a
            LEFT JOIN activity_logs today_log
                ON today_log.activity_id = a.id AND today_log.day = ?2
            LEFT JOIN (
                SELECT activity_id, COUNT(DISTINCT day) AS total_days
                FROM activity_logs
                WHERE count > 0
                GROUP BY activity_id
            ) total_stats ON total_stats.activity_id = a.id
            WHERE a.owner_id = ?1
            ORDER BY a.created_at DESC
            "#,
        )?;

        let rows = stmt
            .query_map(params![owner_id, day], |row| {
                let activity = Self::row_to_activity(row)?;
                let day_count: i64 = row.get("day_count")?;
                let total_days: i64 = row.get("total_days")?;
                Ok((activity, day_count, total_days))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Record one completion: insert the (activity, day) row at count 1 or
    /// bump the existing row. Returns the new count.
    pub fn increment_activity_log(
        &self,
        activity_id: &str,
        owner_id: &str,
        day: &str,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO activity_logs (activity_id, owner_id, day, count, created_at)
            VALUES (?1, ?2, ?3, 1, ?4)
            ON CONFLICT(activity_id, day) DO UPDATE SET count = activity_logs.count + 1
            "#,
            params![activity_id, owner_id, day, now.to_rfc3339()],
        )?;

        let count: i64 = conn.query_row(
            "SELECT count FROM activity_logs WHERE activity_id = ?1 AND day = ?2",
            params![activity_id, day],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Undo one completion: decrement toward zero and delete the row once
    /// it gets there. Absence of a row is the "no activity" state.
    pub fn decrement_activity_log(&self, activity_id: &str, owner_id: &str, day: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            UPDATE activity_logs
            SET count = MAX(count - 1, 0)
            WHERE activity_id = ?1 AND owner_id = ?2 AND day = ?3
            "#,
            params![activity_id, owner_id, day],
        )?;
        conn.execute(
            r#"
            DELETE FROM activity_logs
            WHERE activity_id = ?1 AND owner_id = ?2 AND day = ?3 AND count = 0
            "#,
            params![activity_id, owner_id, day],
        )?;
        Ok(())
    }

    /// Get the log row for one (activity, day), if any
    pub fn get_activity_log(&self, activity_id: &str, day: &str) -> Result<Option<ActivityLogEntry>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM activity_logs WHERE activity_id = ?1 AND day = ?2",
            params![activity_id, day],
            Self::row_to_activity_log,
        )
        .optional()
        .map_err(Error::from)
    }

    /// All days with a positive count for an activity, ascending
    pub fn activity_days(&self, activity_id: &str) -> Result<Vec<NaiveDate>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT day FROM activity_logs WHERE activity_id = ? AND count > 0 ORDER BY day ASC",
        )?;

        let days = stmt
            .query_map([activity_id], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .filter_map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
            .collect();

        Ok(days)
    }

    /// Whole-day rollup across a user's activities
    pub fn day_totals(&self, owner_id: &str, day: &str) -> Result<TodaySummary> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            r#"
            SELECT COALESCE(SUM(count), 0), COUNT(DISTINCT activity_id)
            FROM activity_logs
            WHERE owner_id = ?1 AND day = ?2 AND count > 0
            "#,
            params![owner_id, day],
            |row| {
                Ok(TodaySummary {
                    total_actions: row.get(0)?,
                    active_activities: row.get(1)?,
                })
            },
        )
        .map_err(Error::from)
    }

    fn row_to_activity(row: &Row) -> rusqlite::Result<Activity> {
        let created_at_str: String = row.get("created_at")?;
        Ok(Activity {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            name: row.get("name")?,
            emoji: row.get("emoji")?,
            description: row.get("description")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    fn row_to_activity_log(row: &Row) -> rusqlite::Result<ActivityLogEntry> {
        let created_at_str: String = row.get("created_at")?;
        Ok(ActivityLogEntry {
            id: row.get("id")?,
            activity_id: row.get("activity_id")?,
            owner_id: row.get("owner_id")?,
            day: row.get("day")?,
            count: row.get("count")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    // ============================================
    // Project operations
    // ============================================

    /// Create a project and its initial subtasks as one atomic unit.
    ///
    /// Either the project and all its subtasks exist afterwards, or none do.
    pub fn create_project_with_subtasks(
        &self,
        project: &Project,
        subtasks: &[SubtaskInput],
    ) -> Result<Vec<Subtask>> {
        let mut created = Vec::with_capacity(subtasks.len());
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO projects (id, owner_id, name, emoji, description, progress_required, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                project.id,
                project.owner_id,
                project.name,
                project.emoji,
                project.description,
                project.progress_required,
                project.created_at.to_rfc3339(),
            ],
        )?;

        for (index, input) in subtasks.iter().enumerate() {
            let subtask = Subtask {
                id: new_id(),
                project_id: project.id.clone(),
                name: input.name.clone(),
                target: input.target,
                unit: input.unit.clone(),
                order: input.order.unwrap_or(index as i64),
            };
            tx.execute(
                "INSERT INTO subtasks (id, project_id, name, target, unit, ord) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    subtask.id,
                    subtask.project_id,
                    subtask.name,
                    subtask.target.to_string(),
                    subtask.unit,
                    subtask.order,
                ],
            )?;
            created.push(subtask);
        }

        tx.commit()?;
        Ok(created)
    }

    /// Load a project, verifying it belongs to the caller
    pub fn get_project_owned(&self, owner_id: &str, project_id: &str) -> Result<Project> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM projects WHERE id = ?1 AND owner_id = ?2",
            params![project_id, owner_id],
            Self::row_to_project,
        )
        .optional()?
        .ok_or(Error::NotFoundOrAccessDenied("project"))
    }

    /// List a user's projects, newest first
    pub fn list_projects(&self, owner_id: &str) -> Result<Vec<Project>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM projects WHERE owner_id = ? ORDER BY created_at DESC")?;

        let projects = stmt
            .query_map([owner_id], Self::row_to_project)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    /// Delete a project; subtasks, progress logs, and daily status cascade
    pub fn delete_project(&self, owner_id: &str, project_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM projects WHERE id = ?1 AND owner_id = ?2",
            params![project_id, owner_id],
        )?;
        if deleted == 0 {
            return Err(Error::NotFoundOrAccessDenied("project"));
        }
        Ok(())
    }

    fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
        let created_at_str: String = row.get("created_at")?;
        Ok(Project {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            name: row.get("name")?,
            emoji: row.get("emoji")?,
            description: row.get("description")?,
            progress_required: row.get("progress_required")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    // ============================================
    // Subtask operations
    // ============================================

    /// List a project's subtasks in display order
    pub fn list_subtasks(&self, project_id: &str) -> Result<Vec<Subtask>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM subtasks WHERE project_id = ? ORDER BY ord ASC")?;

        let subtasks = stmt
            .query_map([project_id], Self::row_to_subtask)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(subtasks)
    }

    /// Load a subtask, verifying it belongs to the given project
    pub fn get_subtask_in_project(&self, project_id: &str, subtask_id: &str) -> Result<Subtask> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM subtasks WHERE id = ?1 AND project_id = ?2",
            params![subtask_id, project_id],
            Self::row_to_subtask,
        )
        .optional()?
        .ok_or(Error::NotFoundOrAccessDenied("subtask"))
    }

    /// Replace-on-edit for a project's subtasks as one atomic unit:
    /// inputs with an id update that subtask, inputs without one insert a
    /// new subtask, and stored subtasks missing from the input set are
    /// deleted. Historical progress-log entries of deleted subtasks stay
    /// stored.
    pub fn replace_subtasks(&self, project_id: &str, inputs: &[SubtaskInput]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let existing: Vec<String> = {
            let mut stmt = tx.prepare("SELECT id FROM subtasks WHERE project_id = ?")?;
            let ids = stmt
                .query_map([project_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            ids
        };

        let kept: Vec<&str> = inputs.iter().filter_map(|s| s.id.as_deref()).collect();
        for id in existing.iter().filter(|id| !kept.contains(&id.as_str())) {
            tx.execute(
                "DELETE FROM subtasks WHERE id = ?1 AND project_id = ?2",
                params![id, project_id],
            )?;
        }

        for (index, input) in inputs.iter().enumerate() {
            let ord = input.order.unwrap_or(index as i64);
            match &input.id {
                Some(id) => {
                    let updated = tx.execute(
                        r#"
                        UPDATE subtasks
                        SET name = ?1, target = ?2, unit = ?3, ord = ?4
                        WHERE id = ?5 AND project_id = ?6
                        "#,
                        params![
                            input.name,
                            input.target.to_string(),
                            input.unit,
                            ord,
                            id,
                            project_id
                        ],
                    )?;
                    if updated == 0 {
                        // Dropping the transaction rolls everything back
                        return Err(Error::NotFoundOrAccessDenied("subtask"));
                    }
                }
                None => {
                    tx.execute(
                        "INSERT INTO subtasks (id, project_id, name, target, unit, ord) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![
                            new_id(),
                            project_id,
                            input.name,
                            input.target.to_string(),
                            input.unit,
                            ord
                        ],
                    )?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn row_to_subtask(row: &Row) -> rusqlite::Result<Subtask> {
        let target_str: String = row.get("target")?;
        Ok(Subtask {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            name: row.get("name")?,
            target: parse_decimal_col(&target_str, 3)?,
            unit: row.get("unit")?,
            order: row.get("ord")?,
        })
    }

    // ============================================
    // Progress log operations
    // ============================================

    /// Append one progress-log entry. Entries are immutable facts: nothing
    /// ever updates or deletes them (`entry.id` is ignored on insert).
    pub fn insert_progress_log(&self, entry: &ProgressLogEntry) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO progress_logs (project_id, subtask_id, day, delta, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.project_id,
                entry.subtask_id,
                entry.day,
                entry.delta.to_string(),
                entry.note,
                entry.created_at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// All log entries for one (project, day), in append order
    pub fn progress_logs_for_day(&self, project_id: &str, day: &str) -> Result<Vec<ProgressLogEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM progress_logs WHERE project_id = ?1 AND day = ?2 ORDER BY id ASC",
        )?;

        let entries = stmt
            .query_map(params![project_id, day], Self::row_to_progress_log)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn row_to_progress_log(row: &Row) -> rusqlite::Result<ProgressLogEntry> {
        let delta_str: String = row.get("delta")?;
        let created_at_str: String = row.get("created_at")?;
        Ok(ProgressLogEntry {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            subtask_id: row.get("subtask_id")?,
            day: row.get("day")?,
            delta: parse_decimal_col(&delta_str, 4)?,
            note: row.get("note")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    // ============================================
    // Daily status operations
    // ============================================

    /// Get the derived status for one (project, day), if computed
    pub fn get_daily_status(&self, project_id: &str, day: &str) -> Result<Option<DailyStatus>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM daily_status WHERE project_id = ?1 AND day = ?2",
            params![project_id, day],
            Self::row_to_daily_status,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Idempotently upsert the derived status for one (project, day)
    pub fn upsert_daily_status(&self, status: &DailyStatus) -> Result<()> {
        let totals_json = serde_json::to_string(&status.totals)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO daily_status (project_id, day, totals, is_completed, completed_at, computed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(project_id, day) DO UPDATE SET
                totals = excluded.totals,
                is_completed = excluded.is_completed,
                completed_at = excluded.completed_at,
                computed_at = excluded.computed_at
            "#,
            params![
                status.project_id,
                status.day,
                totals_json,
                status.is_completed,
                status.completed_at.map(|t| t.to_rfc3339()),
                status.computed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Derived statuses for a project in an inclusive day range, ascending
    pub fn daily_statuses_in_range(
        &self,
        project_id: &str,
        from_day: &str,
        to_day: &str,
    ) -> Result<Vec<DailyStatus>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM daily_status
            WHERE project_id = ?1 AND day >= ?2 AND day <= ?3
            ORDER BY day ASC
            "#,
        )?;

        let statuses = stmt
            .query_map(params![project_id, from_day, to_day], Self::row_to_daily_status)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(statuses)
    }

    fn row_to_daily_status(row: &Row) -> rusqlite::Result<DailyStatus> {
        let totals_str: String = row.get("totals")?;
        let completed_at_str: Option<String> = row.get("completed_at")?;
        let computed_at_str: String = row.get("computed_at")?;

        Ok(DailyStatus {
            project_id: row.get("project_id")?,
            day: row.get("day")?,
            totals: serde_json::from_str(&totals_str).unwrap_or_default(),
            is_completed: row.get("is_completed")?,
            completed_at: completed_at_str
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            computed_at: DateTime::parse_from_rfc3339(&computed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

fn parse_decimal_col(value: &str, idx: usize) -> rusqlite::Result<Decimal> {
    Decimal::from_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
    }

    fn make_activity(db: &Database, owner: &str, name: &str) -> Activity {
        let activity = Activity {
            id: new_id(),
            owner_id: owner.to_string(),
            name: name.to_string(),
            emoji: None,
            description: None,
            created_at: now(),
        };
        db.insert_activity(&activity).unwrap();
        activity
    }

    #[test]
    fn test_increment_and_undo_lifecycle() {
        let db = test_db();
        let activity = make_activity(&db, "u1", "Read");

        assert_eq!(
            db.increment_activity_log(&activity.id, "u1", "2025-06-10", now())
                .unwrap(),
            1
        );
        assert_eq!(
            db.increment_activity_log(&activity.id, "u1", "2025-06-10", now())
                .unwrap(),
            2
        );

        db.decrement_activity_log(&activity.id, "u1", "2025-06-10")
            .unwrap();
        let log = db.get_activity_log(&activity.id, "2025-06-10").unwrap();
        assert_eq!(log.unwrap().count, 1);

        // Decrementing to zero deletes the row rather than leaving a zero
        db.decrement_activity_log(&activity.id, "u1", "2025-06-10")
            .unwrap();
        assert!(db.get_activity_log(&activity.id, "2025-06-10").unwrap().is_none());

        // Undo with no row is a no-op
        db.decrement_activity_log(&activity.id, "u1", "2025-06-10")
            .unwrap();
    }

    #[test]
    fn test_ownership_scoped_loaders() {
        let db = test_db();
        let activity = make_activity(&db, "u1", "Read");

        assert!(db.get_activity_owned("u1", &activity.id).is_ok());
        assert!(matches!(
            db.get_activity_owned("u2", &activity.id),
            Err(Error::NotFoundOrAccessDenied("activity"))
        ));
        assert!(matches!(
            db.get_activity_owned("u1", "missing"),
            Err(Error::NotFoundOrAccessDenied("activity"))
        ));

        assert!(matches!(
            db.update_activity("u2", &activity.id, &NewActivity::default()),
            Err(Error::NotFoundOrAccessDenied("activity"))
        ));
        assert!(matches!(
            db.delete_activity("u2", &activity.id),
            Err(Error::NotFoundOrAccessDenied("activity"))
        ));
    }

    #[test]
    fn test_delete_activity_cascades_logs() {
        let db = test_db();
        let activity = make_activity(&db, "u1", "Read");
        db.increment_activity_log(&activity.id, "u1", "2025-06-10", now())
            .unwrap();

        db.delete_activity("u1", &activity.id).unwrap();
        assert!(db.get_activity_log(&activity.id, "2025-06-10").unwrap().is_none());
    }

    fn make_project(db: &Database, owner: &str, targets: &[&str]) -> (Project, Vec<Subtask>) {
        let project = Project {
            id: new_id(),
            owner_id: owner.to_string(),
            name: "Write a book".to_string(),
            emoji: None,
            description: None,
            progress_required: true,
            created_at: now(),
        };
        let inputs: Vec<SubtaskInput> = targets
            .iter()
            .enumerate()
            .map(|(i, t)| SubtaskInput {
                id: None,
                name: format!("step {}", i + 1),
                target: Decimal::from_str(t).unwrap(),
                unit: None,
                order: None,
            })
            .collect();
        let subtasks = db.create_project_with_subtasks(&project, &inputs).unwrap();
        (project, subtasks)
    }

    #[test]
    fn test_replace_subtasks_deletes_missing_and_upserts_present() {
        let db = test_db();
        let (project, subtasks) = make_project(&db, "u1", &["10", "20"]);

        let inputs = vec![
            SubtaskInput {
                id: Some(subtasks[0].id.clone()),
                name: "step 1 renamed".to_string(),
                target: Decimal::from(15),
                unit: Some("pages".to_string()),
                order: Some(0),
            },
            SubtaskInput {
                id: None,
                name: "brand new".to_string(),
                target: Decimal::from(5),
                unit: None,
                order: Some(1),
            },
        ];
        db.replace_subtasks(&project.id, &inputs).unwrap();

        let stored = db.list_subtasks(&project.id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, subtasks[0].id);
        assert_eq!(stored[0].name, "step 1 renamed");
        assert_eq!(stored[0].target, Decimal::from(15));
        assert!(stored.iter().all(|s| s.id != subtasks[1].id));
    }

    #[test]
    fn test_replace_subtasks_unknown_id_rolls_back() {
        let db = test_db();
        let (project, subtasks) = make_project(&db, "u1", &["10"]);

        let inputs = vec![SubtaskInput {
            id: Some("not-a-subtask".to_string()),
            name: "x".to_string(),
            target: Decimal::from(1),
            unit: None,
            order: None,
        }];
        assert!(matches!(
            db.replace_subtasks(&project.id, &inputs),
            Err(Error::NotFoundOrAccessDenied("subtask"))
        ));

        // Nothing was deleted or changed
        let stored = db.list_subtasks(&project.id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, subtasks[0].id);
    }

    #[test]
    fn test_progress_log_day_filter() {
        let db = test_db();
        let (project, subtasks) = make_project(&db, "u1", &["10"]);

        for (day, delta) in [("2025-06-09", "3"), ("2025-06-10", "5"), ("2025-06-10", "-2")] {
            db.insert_progress_log(&ProgressLogEntry {
                id: 0,
                project_id: project.id.clone(),
                subtask_id: subtasks[0].id.clone(),
                day: day.to_string(),
                delta: Decimal::from_str(delta).unwrap(),
                note: None,
                created_at: now(),
            })
            .unwrap();
        }

        let entries = db.progress_logs_for_day(&project.id, "2025-06-10").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].delta, Decimal::from(5));
        assert_eq!(entries[1].delta, Decimal::from(-2));
    }

    #[test]
    fn test_daily_status_upsert_roundtrip() {
        let db = test_db();
        let (project, subtasks) = make_project(&db, "u1", &["10"]);

        let mut totals = std::collections::BTreeMap::new();
        totals.insert(subtasks[0].id.clone(), "7.5".to_string());
        let status = DailyStatus {
            project_id: project.id.clone(),
            day: "2025-06-10".to_string(),
            totals: totals.clone(),
            is_completed: false,
            completed_at: None,
            computed_at: now(),
        };
        db.upsert_daily_status(&status).unwrap();

        let stored = db.get_daily_status(&project.id, "2025-06-10").unwrap().unwrap();
        assert_eq!(stored.totals, totals);
        assert!(!stored.is_completed);

        // Second upsert for the same key replaces, not duplicates
        let updated = DailyStatus {
            is_completed: true,
            completed_at: Some(now()),
            ..status
        };
        db.upsert_daily_status(&updated).unwrap();
        let stored = db.get_daily_status(&project.id, "2025-06-10").unwrap().unwrap();
        assert!(stored.is_completed);
        assert!(stored.completed_at.is_some());

        let range = db
            .daily_statuses_in_range(&project.id, "2025-06-01", "2025-06-30")
            .unwrap();
        assert_eq!(range.len(), 1);
    }
}
