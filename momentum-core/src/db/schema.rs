//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.
//! Running the migrations is the explicit, idempotent provisioning step:
//! it happens once at process startup, never lazily behind a mutable
//! "already initialized" flag.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    -- ============================================
    -- Canonical (source of truth)
    -- ============================================

    CREATE TABLE IF NOT EXISTS activities (
        id          TEXT PRIMARY KEY,
        owner_id    TEXT NOT NULL,
        name        TEXT NOT NULL,
        emoji       TEXT,
        description TEXT,
        created_at  DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_activities_owner ON activities(owner_id);

    -- At most one row per (activity, day); the row is deleted when its
    -- count drops to zero
    CREATE TABLE IF NOT EXISTS activity_logs (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        activity_id TEXT NOT NULL REFERENCES activities(id) ON DELETE CASCADE,
        owner_id    TEXT NOT NULL,
        day         TEXT NOT NULL,
        count       INTEGER NOT NULL,
        created_at  DATETIME NOT NULL,

        UNIQUE(activity_id, day)
    );

    CREATE INDEX IF NOT EXISTS idx_activity_logs_owner_day ON activity_logs(owner_id, day);

    CREATE TABLE IF NOT EXISTS projects (
        id                TEXT PRIMARY KEY,
        owner_id          TEXT NOT NULL,
        name              TEXT NOT NULL,
        emoji             TEXT,
        description       TEXT,
        progress_required INTEGER NOT NULL DEFAULT 1,
        created_at        DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner_id);

    CREATE TABLE IF NOT EXISTS subtasks (
        id         TEXT PRIMARY KEY,
        project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        name       TEXT NOT NULL,
        target     TEXT NOT NULL,     -- canonical decimal string, > 0
        unit       TEXT,
        ord        INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_subtasks_project ON subtasks(project_id);

    -- Append-only. subtask_id carries no foreign key: entries for a
    -- deleted subtask stay stored and are excluded from recomputation
    CREATE TABLE IF NOT EXISTS progress_logs (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        subtask_id TEXT NOT NULL,
        day        TEXT NOT NULL,
        delta      TEXT NOT NULL,     -- signed canonical decimal string
        note       TEXT,
        created_at DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_progress_logs_project_day ON progress_logs(project_id, day);

    -- ============================================
    -- Derived (regenerable)
    -- ============================================

    CREATE TABLE IF NOT EXISTS daily_status (
        project_id   TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        day          TEXT NOT NULL,
        totals       JSON NOT NULL,   -- subtask id -> decimal string
        is_completed INTEGER NOT NULL,
        completed_at DATETIME,
        computed_at  DATETIME NOT NULL,

        PRIMARY KEY (project_id, day)
    );
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
