//! Core domain types for momentum
//!
//! These types represent the canonical data model: user-owned habits and
//! projects, the append-only logs recording activity against them, and the
//! derived per-day status rows regenerated from those logs.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Activity** | A simple counter-style habit ("Read", "Meditate"); one tap per completion |
//! | **Project** | A multi-step goal with Subtasks, each carrying a daily target |
//! | **Subtask** | One measurable step of a Project (target, optional unit, display order) |
//! | **Local day** | The calendar date in the caller's timezone, keyed as `YYYY-MM-DD` |
//! | **Delta** | A signed decimal quantity one progress-log entry adds to a subtask's daily total |
//! | **Daily status** | The derived completion record for (project, local day), regenerable from the log |
//!
//! Every row is scoped to an `owner_id`. The core never performs
//! authentication; it receives an already-authenticated owner id and
//! re-verifies ownership on each entry point.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================
// Activities (counter-style habits)
// ============================================

/// A named habit the user logs discrete completions against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier (UUID)
    pub id: String,
    /// Owning user
    pub owner_id: String,
    /// Display name
    pub name: String,
    /// Optional emoji shown next to the name
    pub emoji: Option<String>,
    /// Optional free-form description
    pub description: Option<String>,
    /// When this activity was created
    pub created_at: DateTime<Utc>,
}

/// One row per (activity, local day) holding that day's completion count.
///
/// The row is created with `count = 1` on the first increment, bumped on
/// each further increment, decremented on undo, and deleted once the count
/// reaches zero. Absence of a row is the "no activity that day" state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    /// Row id
    pub id: i64,
    /// Activity this entry belongs to
    pub activity_id: String,
    /// Owning user
    pub owner_id: String,
    /// Local-day key (`YYYY-MM-DD`)
    pub day: String,
    /// Completion count for the day (always > 0 for a stored row)
    pub count: i64,
    /// When the row was first created
    pub created_at: DateTime<Utc>,
}

/// Input for creating or editing an activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewActivity {
    pub name: String,
    pub emoji: Option<String>,
    pub description: Option<String>,
}

/// Result of a single increment: the day it landed on, the new count, and
/// the streak including it.
#[derive(Debug, Clone)]
pub struct IncrementOutcome {
    /// Local-day key the increment was bucketed into
    pub day: String,
    /// Count for that day after the increment
    pub count: i64,
    /// Current streak after the increment
    pub current_streak: u32,
}

/// Current and best streak for one activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakSummary {
    /// Consecutive days with activity, ending today (0 if none today)
    pub current: u32,
    /// Longest run of consecutive days ever observed
    pub best: u32,
}

/// An activity with its derived read-side fields for list views.
#[derive(Debug, Clone)]
pub struct ActivitySummary {
    pub activity: Activity,
    /// Completion count for the requested day
    pub today_count: i64,
    /// Number of distinct days with at least one completion
    pub total_days: i64,
    pub current_streak: u32,
    pub best_streak: u32,
}

/// Whole-day rollup across all of a user's activities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodaySummary {
    /// Sum of counts across all activities for the day
    pub total_actions: i64,
    /// Number of distinct activities with a positive count
    pub active_activities: i64,
}

// ============================================
// Projects and subtasks
// ============================================

/// A multi-step goal. Completion for a day is derived: every subtask's
/// folded total must reach its target, and `progress_required` must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier (UUID)
    pub id: String,
    /// Owning user
    pub owner_id: String,
    pub name: String,
    pub emoji: Option<String>,
    pub description: Option<String>,
    /// When false the project never contributes to "completed today"
    pub progress_required: bool,
    /// When this project was created
    pub created_at: DateTime<Utc>,
}

/// One measurable step of a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    /// Unique identifier (UUID)
    pub id: String,
    /// Project this subtask belongs to
    pub project_id: String,
    pub name: String,
    /// Daily target, always positive, exact decimal
    pub target: Decimal,
    /// Optional unit label ("pages", "km")
    pub unit: Option<String>,
    /// Display order within the project
    pub order: i64,
}

/// Input for one subtask in a create or replace-on-edit call.
///
/// An input with an `id` updates the existing subtask; without one it
/// creates a new subtask. On edit, stored subtasks missing from the input
/// set are deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskInput {
    pub id: Option<String>,
    pub name: String,
    pub target: Decimal,
    pub unit: Option<String>,
    pub order: Option<i64>,
}

/// Input for creating a project together with its initial subtasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub emoji: Option<String>,
    pub description: Option<String>,
    pub progress_required: bool,
    pub subtasks: Vec<SubtaskInput>,
}

// ============================================
// Progress log (source of truth)
// ============================================

/// An immutable append-only fact: one signed delta against one subtask on
/// one local day. Never updated or deleted by the aggregator; daily totals
/// are always re-derived by folding these rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressLogEntry {
    /// Row id
    pub id: i64,
    pub project_id: String,
    /// Referenced loosely: entries survive the deletion of their subtask
    /// and are then simply excluded from recomputation
    pub subtask_id: String,
    /// Local-day bucket key (`YYYY-MM-DD`)
    pub day: String,
    /// Signed delta; negative values are manual corrections
    pub delta: Decimal,
    pub note: Option<String>,
    /// When the entry was appended
    pub created_at: DateTime<Utc>,
}

/// Input for appending one progress-log entry.
#[derive(Debug, Clone)]
pub struct LogProgressInput {
    pub project_id: String,
    pub subtask_id: String,
    pub delta: Decimal,
    pub note: Option<String>,
    /// Instant the progress happened (bucketed into a local day)
    pub at: DateTime<Utc>,
    /// Optional IANA timezone name for bucketing; falls back to host-local
    pub timezone: Option<String>,
}

/// What the caller gets back after an append-and-recompute.
#[derive(Debug, Clone)]
pub struct LogOutcome {
    /// Local-day key the entry was bucketed into
    pub day: String,
    /// Freshly persisted per-subtask totals (canonical decimal strings)
    pub totals: BTreeMap<String, String>,
    pub is_completed: bool,
}

// ============================================
// Derived daily status (regenerable)
// ============================================

/// Materialized result of folding one day's progress log for one project.
///
/// Keyed by (project, day) and idempotently upserted; always reproducible
/// by re-running aggregation over the log, never an independent source of
/// truth. `totals` maps subtask id to the canonical decimal string of that
/// day's folded sum, unclamped (clamping to zero is presentation-only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStatus {
    pub project_id: String,
    /// Local-day key (`YYYY-MM-DD`)
    pub day: String,
    /// Subtask id -> exact total as a canonical decimal string
    pub totals: BTreeMap<String, String>,
    pub is_completed: bool,
    /// Set while the day is completed, cleared otherwise
    pub completed_at: Option<DateTime<Utc>>,
    /// When this row was last recomputed
    pub computed_at: DateTime<Utc>,
}

// ============================================
// Dashboard (read side)
// ============================================

/// One day of the 7-day completion strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCompletion {
    pub day: String,
    pub completed: bool,
}

/// A subtask with its presentation-ready numbers for the current day.
///
/// Values here are approximate (`f64`) and clamped to zero; every decisive
/// comparison already happened in exact arithmetic before this point.
#[derive(Debug, Clone)]
pub struct SubtaskProgress {
    pub id: String,
    pub name: String,
    pub target: f64,
    pub unit: Option<String>,
    pub today_total: f64,
}

/// Read-side card for one project: today's totals, overall percentage,
/// completion flag, and the trailing 7-day strip.
#[derive(Debug, Clone)]
pub struct ProjectDashboard {
    pub id: String,
    pub name: String,
    pub emoji: Option<String>,
    /// `avg(min(total / target, 1))` across subtasks, in `0.0..=1.0`
    pub progress_pct: f64,
    /// Read from the persisted daily status, never recomputed here
    pub is_completed_today: bool,
    pub subtasks: Vec<SubtaskProgress>,
    /// Oldest first, ending with today
    pub last7: Vec<DayCompletion>,
}
