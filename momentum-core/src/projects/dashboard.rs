//! Read-side project dashboard.
//!
//! Everything here trusts the persisted daily status rows: totals and
//! completion flags are read back, never recomputed. This is also the only
//! place totals are clamped to zero and converted to `f64`; every decisive
//! comparison already happened in exact arithmetic upstream.

use crate::db::Database;
use crate::error::{require_owner, Result};
use crate::types::{DayCompletion, ProjectDashboard, SubtaskProgress};
use crate::{day, decimal};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Build the dashboard cards for all of a user's projects: today's
/// per-subtask totals, overall percentage, completion flag, and the
/// trailing 7-day completion strip.
pub fn project_dashboard(
    db: &Database,
    owner_id: &str,
    at: DateTime<Utc>,
    tz: Option<&str>,
) -> Result<Vec<ProjectDashboard>> {
    require_owner(owner_id)?;

    let today = day::local_date(at, tz);
    let today_key = day::format_day(today);
    let from_key = day::format_day(today - Duration::days(6));

    let projects = db.list_projects(owner_id)?;
    let mut cards = Vec::with_capacity(projects.len());

    for project in projects {
        let subtasks = db.list_subtasks(&project.id)?;
        let status = db.get_daily_status(&project.id, &today_key)?;

        let totals: BTreeMap<String, Decimal> = status
            .as_ref()
            .map(|s| {
                s.totals
                    .iter()
                    .filter_map(|(id, raw)| decimal::parse(raw).ok().map(|d| (id.clone(), d)))
                    .collect()
            })
            .unwrap_or_default();

        let mut rows = Vec::with_capacity(subtasks.len());
        let mut pct_sum = 0.0;
        for subtask in &subtasks {
            let total = totals.get(&subtask.id).copied().unwrap_or(Decimal::ZERO);
            let today_total = decimal::to_display(total).max(0.0);
            let target = decimal::to_display(subtask.target);
            if target > 0.0 {
                pct_sum += (today_total / target).min(1.0);
            }
            rows.push(SubtaskProgress {
                id: subtask.id.clone(),
                name: subtask.name.clone(),
                target,
                unit: subtask.unit.clone(),
                today_total,
            });
        }
        let progress_pct = if rows.is_empty() {
            0.0
        } else {
            pct_sum / rows.len() as f64
        };

        let is_completed_today = status.map(|s| s.is_completed).unwrap_or(false);

        let completed_days: BTreeMap<String, bool> = db
            .daily_statuses_in_range(&project.id, &from_key, &today_key)?
            .into_iter()
            .map(|s| (s.day, s.is_completed))
            .collect();

        let last7 = (0..7)
            .rev()
            .map(|offset| {
                let key = day::format_day(today - Duration::days(offset));
                DayCompletion {
                    completed: completed_days.get(&key).copied().unwrap_or(false),
                    day: key,
                }
            })
            .collect();

        cards.push(ProjectDashboard {
            id: project.id,
            name: project.name,
            emoji: project.emoji,
            progress_pct,
            is_completed_today,
            subtasks: rows,
            last7,
        });
    }

    Ok(cards)
}
