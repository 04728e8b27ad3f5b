//! Task operations.
//!
//! [`TaskService`] composes validation and persistence. Every mutating
//! operation is one read-modify-write of the whole collection: load, change
//! in memory, save. Nothing coordinates two handles writing the same
//! medium, so the last write wins.
//!
//! # Examples
//!
//! ```
//! use tasklist::store::MemoryStorage;
//! use tasklist::{TaskPatch, TaskService};
//!
//! let service = TaskService::new(MemoryStorage::new().open_tab());
//!
//! let milk = service.create("  Buy milk ").unwrap();
//! assert_eq!(milk.description, "Buy milk");
//! assert!(!milk.completed);
//!
//! let done = service.toggle(&milk.id).unwrap();
//! assert!(done.completed);
//!
//! let renamed = service
//!     .update(&milk.id, &TaskPatch::new().with_description("Buy oat milk"))
//!     .unwrap();
//! assert_eq!(renamed.description, "Buy oat milk");
//! assert!(renamed.completed);
//!
//! assert!(service.delete(&milk.id));
//! assert!(!service.delete(&milk.id));
//! assert!(service.list().unwrap().is_empty());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::config::TaskListConfig;
use crate::domain::{
    apply_update, build_new, find_task, find_task_index, generate_id, sort_tasks, Clock,
    SystemClock, Task, TaskPatch, TaskStats,
};
use crate::error::{Result, TaskError};
use crate::store::{StorageBackend, Subscription, TaskStorage};
use crate::validation::{validate_description, validate_id};

/// The task operations API.
pub struct TaskService<B: StorageBackend + 'static> {
    storage: TaskStorage<B>,
    clock: Arc<dyn Clock>,
}

impl<B: StorageBackend + 'static> TaskService<B> {
    /// Creates a service persisting under the default key on `backend`.
    pub fn new(backend: B) -> Self {
        Self::from_storage(TaskStorage::new(backend))
    }

    /// Creates a service using the storage key from `config`.
    pub fn with_config(backend: B, config: &TaskListConfig) -> Self {
        Self::from_storage(TaskStorage::new(backend).with_key(config.storage_key.clone()))
    }

    /// Creates a service on an existing [`TaskStorage`].
    pub fn from_storage(storage: TaskStorage<B>) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used to stamp `createdAt` and `updatedAt`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The persistence layer.
    pub fn storage(&self) -> &TaskStorage<B> {
        &self.storage
    }

    /// All tasks, newest first.
    ///
    /// Corrupt stored data reads as an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Storage`] only if the medium cannot be read.
    pub fn list(&self) -> Result<Vec<Task>> {
        Ok(sort_tasks(self.storage.load()?))
    }

    /// Creates a task from a raw description and appends it.
    ///
    /// # Errors
    ///
    /// [`TaskError::Validation`] for a blank or over-long description,
    /// [`TaskError::Storage`] if the collection cannot be read or written.
    pub fn create(&self, description: &str) -> Result<Task> {
        let description = validate_description(description)?;
        let task = build_new(description, self.clock.as_ref()).with_id(generate_id());

        let mut tasks = self.storage.load()?;
        tasks.push(task.clone());
        self.storage.save(&tasks)?;

        tracing::debug!(task_id = %task.id, "created task");
        Ok(task)
    }

    /// Applies `patch` to the task with `id`.
    ///
    /// `updatedAt` is refreshed even if the patch changes nothing.
    ///
    /// # Errors
    ///
    /// [`TaskError::Validation`] for a malformed id or an invalid
    /// description, [`TaskError::NotFound`] if no task has `id`,
    /// [`TaskError::Storage`] on a medium failure.
    pub fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task> {
        let id = validate_id(id)?;

        let mut tasks = self.storage.load()?;
        let index = find_task_index(&tasks, &id).ok_or_else(|| TaskError::not_found(&id))?;

        let validated = TaskPatch {
            description: patch
                .description
                .as_deref()
                .map(validate_description)
                .transpose()?,
            completed: patch.completed,
        };

        let updated = apply_update(&tasks[index], &validated, self.clock.as_ref());
        tasks[index] = updated.clone();
        self.storage.save(&tasks)?;

        tracing::debug!(task_id = %id, "updated task");
        Ok(updated)
    }

    /// Removes the task with `id`.
    ///
    /// Returns `true` if a task was removed and the collection saved. A
    /// malformed id, an unknown id or a medium failure all return `false`;
    /// medium failures are logged.
    pub fn delete(&self, id: &str) -> bool {
        let Ok(id) = validate_id(id) else {
            tracing::debug!(task_id = id, "delete ignored malformed id");
            return false;
        };

        let mut tasks = match self.storage.load() {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::error!(task_id = %id, error = %e, "delete failed to load tasks");
                return false;
            },
        };

        let Some(index) = find_task_index(&tasks, &id) else {
            tracing::debug!(task_id = %id, "delete found no matching task");
            return false;
        };
        tasks.remove(index);

        if let Err(e) = self.storage.save(&tasks) {
            tracing::error!(task_id = %id, error = %e, "delete failed to save tasks");
            return false;
        }

        tracing::debug!(task_id = %id, "deleted task");
        true
    }

    /// Flips the completion flag of the task with `id`.
    ///
    /// # Errors
    ///
    /// As for [`update`](Self::update).
    pub fn toggle(&self, id: &str) -> Result<Task> {
        let id = validate_id(id)?;
        let tasks = self.storage.load()?;
        let completed = find_task(&tasks, &id)
            .map(|task| task.completed)
            .ok_or_else(|| TaskError::not_found(&id))?;

        self.update(&id, &TaskPatch::new().with_completed(!completed))
    }

    /// Looks up the task with `id`. Absence is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// [`TaskError::Validation`] for a malformed id, [`TaskError::Storage`]
    /// if the medium cannot be read.
    pub fn get(&self, id: &str) -> Result<Option<Task>> {
        let id = validate_id(id)?;
        let tasks = self.storage.load()?;
        Ok(find_task(&tasks, &id).cloned())
    }

    /// Removes every completed task and returns the rest, newest first.
    ///
    /// # Errors
    ///
    /// [`TaskError::Storage`] on a medium failure.
    pub fn clear_completed(&self) -> Result<Vec<Task>> {
        let tasks = self.storage.load()?;
        let before = tasks.len();
        let remaining: Vec<Task> = tasks.into_iter().filter(|task| !task.completed).collect();
        self.storage.save(&remaining)?;

        tracing::debug!(
            removed = before - remaining.len(),
            remaining = remaining.len(),
            "cleared completed tasks"
        );
        Ok(sort_tasks(remaining))
    }

    /// Marks every task completed, refreshing each `updatedAt`.
    ///
    /// # Errors
    ///
    /// [`TaskError::Storage`] on a medium failure.
    pub fn mark_all_completed(&self) -> Result<Vec<Task>> {
        self.mark_all(true)
    }

    /// Marks every task incomplete, refreshing each `updatedAt`.
    ///
    /// # Errors
    ///
    /// [`TaskError::Storage`] on a medium failure.
    pub fn mark_all_incomplete(&self) -> Result<Vec<Task>> {
        self.mark_all(false)
    }

    fn mark_all(&self, completed: bool) -> Result<Vec<Task>> {
        let patch = TaskPatch::new().with_completed(completed);
        let updated: Vec<Task> = self
            .storage
            .load()?
            .iter()
            .map(|task| apply_update(task, &patch, self.clock.as_ref()))
            .collect();
        self.storage.save(&updated)?;

        tracing::debug!(count = updated.len(), completed, "marked all tasks");
        Ok(sort_tasks(updated))
    }

    /// Completion statistics over the stored collection.
    ///
    /// # Errors
    ///
    /// [`TaskError::Storage`] if the medium cannot be read.
    pub fn stats(&self) -> Result<TaskStats> {
        Ok(TaskStats::from_tasks(&self.storage.load()?))
    }

    /// Calls `callback` with the sorted collection whenever another tab
    /// changes it. See [`TaskStorage::subscribe`].
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<Task>) + Send + Sync + 'static,
    {
        self.storage.subscribe(callback)
    }
}

impl<B: StorageBackend + fmt::Debug + 'static> fmt::Debug for TaskService<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskService")
            .field("storage", &self.storage)
            .field("clock", &self.clock)
            .finish()
    }
}
