//! View-model over a [`TaskService`].
//!
//! [`TaskBoard`] is what a presentation layer holds: a snapshot of the
//! sorted collection and the last user-facing error message. The service
//! stays the source of truth. The snapshot is replaced from
//! [`TaskService::list`] after every successful operation and from the
//! change subscription when another tab writes; it is never edited in
//! place.
//!
//! Operations report failure through [`TaskBoard::error`] rather than a
//! `Result`, because the message is meant to be shown as-is.
//!
//! # Examples
//!
//! ```
//! use tasklist::store::MemoryStorage;
//! use tasklist::{TaskBoard, TaskService};
//!
//! let medium = MemoryStorage::new();
//! let mut board = TaskBoard::new(TaskService::new(medium.open_tab()));
//!
//! assert!(board.create_task("").is_none());
//! assert_eq!(board.error(), Some("Description cannot be empty"));
//!
//! let task = board.create_task("Buy milk").unwrap();
//! assert_eq!(board.error(), None);
//! assert_eq!(board.tasks().len(), 1);
//!
//! // another tab empties the list
//! let other = TaskService::new(medium.open_tab());
//! assert!(other.delete(&task.id));
//! assert!(board.sync_external());
//! assert!(board.tasks().is_empty());
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{Task, TaskPatch, TaskStats};
use crate::error::TaskError;
use crate::service::TaskService;
use crate::store::{StorageBackend, Subscription};

/// Shown when the medium ran out of space.
pub const STORAGE_FULL_MESSAGE: &str =
    "Storage is full. Please delete some completed tasks to free up space.";

/// Shown when the collection cannot be loaded.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load tasks. Please try again.";

/// Shown when a task cannot be deleted.
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete task. Please try again.";

fn user_message(err: &TaskError, action: &str) -> String {
    if err.is_validation() {
        err.to_string()
    } else if err.is_quota_exceeded() {
        STORAGE_FULL_MESSAGE.to_string()
    } else {
        format!("Failed to {action}. Please try again.")
    }
}

/// Snapshot-holding view-model.
pub struct TaskBoard<B: StorageBackend + 'static> {
    service: TaskService<B>,
    tasks: Vec<Task>,
    error: Option<String>,
    inbox: Arc<Mutex<Option<Vec<Task>>>>,
    _subscription: Subscription,
}

impl<B: StorageBackend + 'static> TaskBoard<B> {
    /// Loads the initial snapshot and subscribes to changes from other tabs.
    pub fn new(service: TaskService<B>) -> Self {
        let inbox: Arc<Mutex<Option<Vec<Task>>>> = Arc::default();
        let sink = Arc::clone(&inbox);
        let subscription = service.subscribe(move |tasks| {
            *sink.lock() = Some(tasks);
        });

        let mut board = Self {
            service,
            tasks: Vec::new(),
            error: None,
            inbox,
            _subscription: subscription,
        };
        board.refresh();
        board
    }

    /// The current snapshot, newest first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The last user-facing error, if the most recent operation failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Forgets the current error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Counts over the snapshot.
    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.tasks)
    }

    /// The underlying service.
    pub fn service(&self) -> &TaskService<B> {
        &self.service
    }

    /// Reloads the snapshot from the service.
    ///
    /// Returns `false` and sets the load error if the medium fails; the
    /// previous snapshot is kept in that case.
    pub fn refresh(&mut self) -> bool {
        match self.service.list() {
            Ok(tasks) => {
                self.tasks = tasks;
                self.error = None;
                true
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to refresh tasks");
                self.error = Some(LOAD_FAILED_MESSAGE.to_string());
                false
            },
        }
    }

    /// Applies the most recent list delivered by the change subscription.
    ///
    /// Returns `false` if nothing arrived since the last call.
    pub fn sync_external(&mut self) -> bool {
        let Some(tasks) = self.inbox.lock().take() else {
            return false;
        };
        tracing::debug!(count = tasks.len(), "applied external task changes");
        self.tasks = tasks;
        true
    }

    /// Creates a task. Returns `None` and sets the error on failure.
    pub fn create_task(&mut self, description: &str) -> Option<Task> {
        let result = self.service.create(description);
        self.settle(result, "create task")
    }

    /// Updates a task in the snapshot.
    ///
    /// Ids missing from the snapshot are ignored (with a warning) without
    /// touching the service.
    pub fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Option<Task> {
        if !self.knows(id) {
            return None;
        }
        let result = self.service.update(id, patch);
        self.settle(result, "update task")
    }

    /// Flips a task's completion flag. Ids missing from the snapshot are
    /// ignored.
    pub fn toggle_task(&mut self, id: &str) -> Option<Task> {
        if !self.knows(id) {
            return None;
        }
        let result = self.service.toggle(id);
        self.settle(result, "update task")
    }

    /// Deletes a task. Ids missing from the snapshot are ignored.
    ///
    /// If the service could not delete a task the snapshot still shows, the
    /// snapshot is reloaded and the delete error is set.
    pub fn delete_task(&mut self, id: &str) -> bool {
        if !self.knows(id) {
            return false;
        }
        if self.service.delete(id) {
            self.refresh();
            return true;
        }
        self.refresh();
        self.error = Some(DELETE_FAILED_MESSAGE.to_string());
        false
    }

    /// Removes completed tasks.
    pub fn clear_completed(&mut self) -> bool {
        let result = self.service.clear_completed();
        self.settle(result, "update tasks").is_some()
    }

    /// Marks every task completed.
    pub fn mark_all_completed(&mut self) -> bool {
        let result = self.service.mark_all_completed();
        self.settle(result, "update tasks").is_some()
    }

    /// Marks every task incomplete.
    pub fn mark_all_incomplete(&mut self) -> bool {
        let result = self.service.mark_all_incomplete();
        self.settle(result, "update tasks").is_some()
    }

    fn knows(&self, id: &str) -> bool {
        let known = self.tasks.iter().any(|task| task.id == id);
        if !known {
            tracing::warn!(task_id = id, "task not found in current snapshot");
        }
        known
    }

    fn settle<T>(&mut self, result: Result<T, TaskError>, action: &str) -> Option<T> {
        match result {
            Ok(value) => {
                self.refresh();
                Some(value)
            },
            Err(e) => {
                tracing::error!(error = %e, code = e.code(), "failed to {action}");
                self.error = Some(user_message(&e, action));
                None
            },
        }
    }
}
