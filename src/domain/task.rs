//! The task entity and its construction/update templates.
//!
//! Tasks are values: [`apply_update`] returns a new [`Task`] instead of
//! mutating the existing one, and only the service layer decides which
//! value ends up persisted.

use serde::{Deserialize, Serialize};

use super::clock::Clock;

/// A single to-do item.
///
/// Serializes with camelCase keys and nothing else, matching the stored
/// layout: `{"id", "description", "completed", "createdAt", "updatedAt"}`.
///
/// # Examples
///
/// ```
/// use tasklist::Task;
///
/// let task: Task = serde_json::from_str(r#"{
///     "id": "11111111-1111-4111-8111-111111111111",
///     "description": "Buy milk",
///     "completed": false,
///     "createdAt": "2025-01-15T10:30:00.000Z",
///     "updatedAt": "2025-01-15T10:30:00.000Z"
/// }"#).unwrap();
/// assert_eq!(task.description, "Buy milk");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// UUID v4 identifier, assigned at creation.
    pub id: String,

    /// Trimmed description, 1 to 100 characters.
    pub description: String,

    /// Whether the task is done.
    pub completed: bool,

    /// Creation instant (ISO-8601 UTC, milliseconds). Never changes.
    pub created_at: String,

    /// Instant of the most recent mutation.
    pub updated_at: String,
}

/// A task body that has not been assigned an identifier yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Validated description.
    pub description: String,
    /// Always `false` for a new task.
    pub completed: bool,
    /// Creation instant.
    pub created_at: String,
    /// Equal to `created_at`.
    pub updated_at: String,
}

impl NewTask {
    /// Attaches an identifier, producing a complete [`Task`].
    pub fn with_id(self, id: impl Into<String>) -> Task {
        Task {
            id: id.into(),
            description: self.description,
            completed: self.completed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Partial update for a task. Absent fields are left unchanged.
///
/// # Examples
///
/// ```
/// use tasklist::TaskPatch;
///
/// let patch: TaskPatch = serde_json::from_str(r#"{"completed": true}"#).unwrap();
/// assert_eq!(patch, TaskPatch::new().with_completed(true));
/// assert!(patch.description.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New description (validated and trimmed before it is applied).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// New completion flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the description field.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the completion field.
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Returns `true` if neither field is set.
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.completed.is_none()
    }
}

/// Builds the body of a freshly created task.
///
/// `created_at` and `updated_at` come from a single clock reading so they
/// are equal.
pub fn build_new(description: impl Into<String>, clock: &dyn Clock) -> NewTask {
    let now = clock.now_iso();
    NewTask {
        description: description.into(),
        completed: false,
        created_at: now.clone(),
        updated_at: now,
    }
}

/// Overlays `patch` onto `existing` and stamps a fresh `updated_at`.
///
/// The timestamp is refreshed even when the patch changes nothing.
pub fn apply_update(existing: &Task, patch: &TaskPatch, clock: &dyn Clock) -> Task {
    Task {
        id: existing.id.clone(),
        description: patch
            .description
            .clone()
            .unwrap_or_else(|| existing.description.clone()),
        completed: patch.completed.unwrap_or(existing.completed),
        created_at: existing.created_at.clone(),
        updated_at: clock.now_iso(),
    }
}

/// Finds a task by identifier.
pub fn find_task<'a>(tasks: &'a [Task], id: &str) -> Option<&'a Task> {
    tasks.iter().find(|task| task.id == id)
}

/// Finds the position of a task by identifier.
pub fn find_task_index(tasks: &[Task], id: &str) -> Option<usize> {
    tasks.iter().position(|task| task.id == id)
}
