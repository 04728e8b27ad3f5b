//! Completion filters and summary counts.

use serde::{Deserialize, Serialize};

use super::task::Task;

/// Tasks marked as done, in their input order.
pub fn completed_tasks(tasks: &[Task]) -> Vec<Task> {
    tasks.iter().filter(|t| t.completed).cloned().collect()
}

/// Tasks not yet done, in their input order.
pub fn incomplete_tasks(tasks: &[Task]) -> Vec<Task> {
    tasks.iter().filter(|t| !t.completed).cloned().collect()
}

/// Summary counts over a collection.
///
/// # Examples
///
/// ```
/// use tasklist::domain::TaskStats;
///
/// let stats = TaskStats::from_tasks(&[]);
/// assert_eq!(stats.total, 0);
/// assert_eq!(stats.completion_rate, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    /// Number of tasks.
    pub total: usize,
    /// Number of completed tasks.
    pub completed: usize,
    /// Number of incomplete tasks.
    pub incomplete: usize,
    /// Completed share as a whole percentage, rounded half up. Zero for an
    /// empty collection.
    pub completion_rate: u8,
}

impl TaskStats {
    /// Computes the counts for `tasks`.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        let completion_rate = if total == 0 {
            0
        } else {
            // (200c + t) / 2t == round(100c / t) with halves rounded up
            u8::try_from((200 * completed + total) / (2 * total)).unwrap_or(100)
        };

        Self {
            total,
            completed,
            incomplete: total - completed,
            completion_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn tasks(flags: &[bool]) -> Vec<Task> {
        flags
            .iter()
            .enumerate()
            .map(|(i, &completed)| Task {
                id: format!("{i}"),
                description: format!("task {i}"),
                completed,
                created_at: "2025-01-01T00:00:00.000Z".to_string(),
                updated_at: "2025-01-01T00:00:00.000Z".to_string(),
            })
            .collect()
    }

    #[test_case(&[], 0 ; "empty")]
    #[test_case(&[true], 100 ; "all done")]
    #[test_case(&[true, false], 50 ; "half")]
    #[test_case(&[true, false, false], 33 ; "third rounds down")]
    #[test_case(&[true, true, false], 67 ; "two thirds rounds up")]
    #[test_case(&[true, false, false, false, false, false, false, false], 13 ; "twelve and a half rounds up")]
    fn completion_rate(flags: &[bool], expected: u8) {
        assert_eq!(TaskStats::from_tasks(&tasks(flags)).completion_rate, expected);
    }

    #[test]
    fn counts_and_filters() {
        let all = tasks(&[true, false, true]);
        let stats = TaskStats::from_tasks(&all);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.incomplete, 1);

        assert_eq!(completed_tasks(&all).len(), 2);
        let open = incomplete_tasks(&all);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "1");
    }
}
