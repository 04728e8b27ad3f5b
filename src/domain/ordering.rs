//! Display order for task collections.
//!
//! The persisted collection carries no order, so every read re-sorts with
//! [`compare`]: newest `created_at` first, ties broken by `id` descending.
//! The id tie-break makes the order total, so tasks created within the same
//! millisecond still come back in a reproducible order.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::task::Task;

/// Parses a stored timestamp. Besides RFC 3339, a date-time without an
/// offset and a bare date are accepted, both read as UTC.
fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.to_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn created_instant(task: &Task) -> Option<DateTime<Utc>> {
    parse_instant(&task.created_at)
}

/// Newest-first comparator over tasks.
///
/// Creation instants are compared as instants, not strings, so the same
/// instant written with different offsets ties and falls to the id. A task
/// whose `created_at` does not parse sorts after every task whose does.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use tasklist::domain::compare;
/// use tasklist::Task;
///
/// let older = Task {
///     id: "11111111-1111-4111-8111-111111111111".into(),
///     description: "older".into(),
///     completed: false,
///     created_at: "2025-01-01T00:00:00.000Z".into(),
///     updated_at: "2025-01-01T00:00:00.000Z".into(),
/// };
/// let newer = Task {
///     id: "22222222-2222-4222-8222-222222222222".into(),
///     created_at: "2025-01-02T00:00:00.000Z".into(),
///     ..older.clone()
/// };
/// assert_eq!(compare(&newer, &older), Ordering::Less);
/// ```
pub fn compare(a: &Task, b: &Task) -> Ordering {
    created_instant(b)
        .cmp(&created_instant(a))
        .then_with(|| b.id.cmp(&a.id))
}

/// Sorts `tasks` into display order.
pub fn sort_tasks(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(compare);
    tasks
}
