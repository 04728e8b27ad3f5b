//! Whole-collection persistence on top of a [`StorageBackend`].
//!
//! The collection is stored as one JSON array under a single key. Reads are
//! forgiving: a missing key, unparsable JSON or a non-array value all load
//! as an empty collection, and individual records that do not have the
//! expected shape are dropped. Only a failure of the medium itself is
//! reported as an error.
//!
//! # Examples
//!
//! ```
//! use tasklist::store::{MemoryStorage, TaskStorage};
//!
//! let storage = TaskStorage::new(MemoryStorage::new().open_tab());
//! assert!(storage.load().unwrap().is_empty());
//!
//! storage.save(&[]).unwrap();
//! storage.clear().unwrap();
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;

use super::{ListenerId, StorageBackend, StorageEvent};
use crate::constants::DEFAULT_STORAGE_KEY;
use crate::domain::{sort_tasks, Task};
use crate::error::{Result, StorageOperation, TaskError};

const STRING_FIELDS: [&str; 4] = ["id", "description", "createdAt", "updatedAt"];

fn has_task_shape(value: &Value) -> bool {
    let Some(record) = value.as_object() else {
        return false;
    };
    STRING_FIELDS
        .iter()
        .all(|field| record.get(*field).is_some_and(Value::is_string))
        && record.get("completed").is_some_and(Value::is_boolean)
}

/// Parses a stored collection, recovering from corruption.
///
/// Returns an empty list when `raw` is not JSON or not an array. Elements
/// missing any of the five task fields, or holding a field of the wrong
/// kind, are skipped. Extra fields are ignored.
///
/// # Examples
///
/// ```
/// use tasklist::store::parse_tasks;
///
/// assert!(parse_tasks("not json").is_empty());
/// assert!(parse_tasks(r#"{"id": "x"}"#).is_empty());
///
/// let tasks = parse_tasks(r#"[
///     {"id": "a", "description": "kept", "completed": false,
///      "createdAt": "2025-01-01T00:00:00.000Z", "updatedAt": "2025-01-01T00:00:00.000Z"},
///     {"id": "b", "description": "dropped", "completed": "yes",
///      "createdAt": "2025-01-01T00:00:00.000Z", "updatedAt": "2025-01-01T00:00:00.000Z"}
/// ]"#);
/// assert_eq!(tasks.len(), 1);
/// assert_eq!(tasks[0].description, "kept");
/// ```
pub fn parse_tasks(raw: &str) -> Vec<Task> {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "stored tasks are not valid JSON, starting empty");
            return Vec::new();
        },
    };

    let Value::Array(records) = parsed else {
        tracing::warn!("stored tasks are not an array, starting empty");
        return Vec::new();
    };

    let total = records.len();
    let tasks: Vec<Task> = records
        .into_iter()
        .filter(has_task_shape)
        .filter_map(|record| serde_json::from_value(record).ok())
        .collect();

    if tasks.len() < total {
        tracing::debug!(
            dropped = total - tasks.len(),
            kept = tasks.len(),
            "dropped malformed task records"
        );
    }
    tasks
}

fn load_from(backend: &dyn StorageBackend, key: &str) -> Result<Vec<Task>> {
    match backend.get_item(key) {
        Ok(Some(raw)) => Ok(parse_tasks(&raw)),
        Ok(None) => Ok(Vec::new()),
        Err(e) => {
            tracing::error!(key, error = %e, "failed to read tasks");
            Err(TaskError::storage(StorageOperation::Read, Some(e)))
        },
    }
}

/// Loads, saves and clears the task collection under one key.
pub struct TaskStorage<B: StorageBackend + 'static> {
    backend: Arc<B>,
    key: String,
}

impl<B: StorageBackend + 'static> TaskStorage<B> {
    /// Persists under [`DEFAULT_STORAGE_KEY`] on `backend`.
    pub fn new(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    /// Persists on a backend that is shared with other owners.
    pub fn from_arc(backend: Arc<B>) -> Self {
        Self {
            backend,
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    /// Uses `key` instead of the default storage key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// The storage key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying medium.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Reads the stored collection, in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Storage`] with [`StorageOperation::Read`] if the
    /// medium cannot be read. Corrupt content is not an error.
    pub fn load(&self) -> Result<Vec<Task>> {
        load_from(self.backend.as_ref(), &self.key)
    }

    /// Replaces the stored collection with `tasks`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Storage`] with [`StorageOperation::Write`]. A
    /// full medium yields the message `"Storage quota exceeded"`.
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        let raw = serde_json::to_string(tasks).map_err(|e| {
            tracing::error!(error = %e, "failed to serialize tasks");
            TaskError::storage(StorageOperation::Write, None)
        })?;

        self.backend.set_item(&self.key, &raw).map_err(|e| {
            tracing::error!(key = %self.key, error = %e, "failed to save tasks");
            TaskError::storage(StorageOperation::Write, Some(e))
        })?;

        tracing::debug!(key = %self.key, count = tasks.len(), "saved tasks");
        Ok(())
    }

    /// Removes the stored collection.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Storage`] with [`StorageOperation::Delete`].
    pub fn clear(&self) -> Result<()> {
        self.backend.remove_item(&self.key).map_err(|e| {
            tracing::error!(key = %self.key, error = %e, "failed to clear tasks");
            TaskError::storage(StorageOperation::Delete, Some(e))
        })?;
        tracing::debug!(key = %self.key, "cleared tasks");
        Ok(())
    }

    /// Calls `callback` with the freshly loaded, sorted collection whenever
    /// another tab changes the storage key.
    ///
    /// Changes made through this storage's own backend handle are not
    /// reported. If reloading fails, the error is logged and the callback
    /// is not called.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::{Arc, Mutex};
    /// use tasklist::store::{MemoryStorage, TaskStorage};
    ///
    /// let medium = MemoryStorage::new();
    /// let mine = TaskStorage::new(medium.open_tab());
    /// let theirs = TaskStorage::new(medium.open_tab());
    ///
    /// let seen = Arc::new(Mutex::new(None));
    /// let sink = Arc::clone(&seen);
    /// let subscription = mine.subscribe(move |tasks| {
    ///     *sink.lock().unwrap() = Some(tasks.len());
    /// });
    ///
    /// theirs.save(&[]).unwrap();
    /// assert_eq!(*seen.lock().unwrap(), Some(0));
    /// assert!(subscription.unsubscribe());
    /// ```
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<Task>) + Send + Sync + 'static,
    {
        let backend: Weak<B> = Arc::downgrade(&self.backend);
        let key = self.key.clone();

        let id = self.backend.add_listener(Arc::new(move |event: &StorageEvent| {
            if event.key != key {
                return;
            }
            let Some(backend) = backend.upgrade() else {
                return;
            };
            match load_from(backend.as_ref(), &key) {
                Ok(tasks) => callback(sort_tasks(tasks)),
                Err(e) => {
                    tracing::error!(key = %key, error = %e, "failed to reload tasks after external change");
                },
            }
        }));

        tracing::debug!(key = %self.key, listener = %id, "subscribed to external changes");
        let backend: Arc<dyn StorageBackend> = self.backend.clone();
        Subscription {
            backend,
            id: Some(id),
        }
    }
}

impl<B: StorageBackend + 'static> Clone for TaskStorage<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            key: self.key.clone(),
        }
    }
}

impl<B: StorageBackend + fmt::Debug + 'static> fmt::Debug for TaskStorage<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStorage")
            .field("backend", &self.backend)
            .field("key", &self.key)
            .finish()
    }
}

/// Handle for a change listener registered by [`TaskStorage::subscribe`].
///
/// The handle keeps the backend it was registered on alive, so delivery
/// continues after the [`TaskStorage`] itself is dropped. Dropping the
/// handle unregisters the listener.
#[must_use = "dropping a Subscription unregisters its listener immediately"]
pub struct Subscription {
    backend: Arc<dyn StorageBackend>,
    id: Option<ListenerId>,
}

impl Subscription {
    /// The registered listener's id.
    pub fn id(&self) -> Option<ListenerId> {
        self.id
    }

    /// Unregisters the listener.
    ///
    /// Returns `false` if the medium no longer knew the listener.
    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        let Some(id) = self.id.take() else {
            return false;
        };
        let removed = self.backend.remove_listener(id);
        tracing::debug!(listener = %id, removed, "unsubscribed from external changes");
        removed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Fault, FaultMode, FaultyBackend, MemoryStorage, MemoryTab};
    use parking_lot::Mutex;

    fn task(id: &str, created_at: &str) -> Task {
        Task {
            id: id.to_string(),
            description: format!("task {id}"),
            completed: false,
            created_at: created_at.to_string(),
            updated_at: created_at.to_string(),
        }
    }

    fn storage() -> TaskStorage<MemoryTab> {
        TaskStorage::new(MemoryStorage::new().open_tab())
    }

    #[test]
    fn load_of_absent_key_is_empty() {
        assert!(storage().load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_preserves_stored_order() {
        let storage = storage();
        let tasks = vec![
            task("a", "2025-01-01T00:00:00.000Z"),
            task("b", "2025-01-02T00:00:00.000Z"),
        ];
        storage.save(&tasks).unwrap();
        assert_eq!(storage.load().unwrap(), tasks);
    }

    #[test]
    fn stored_layout_uses_camel_case_keys() {
        let storage = storage();
        storage
            .save(&[task("a", "2025-01-01T00:00:00.000Z")])
            .unwrap();
        let raw = storage.backend().get_item(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        let record = value[0].as_object().unwrap();
        let mut keys: Vec<&str> = record.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["completed", "createdAt", "description", "id", "updatedAt"]
        );
    }

    #[test]
    fn corrupt_content_loads_empty() {
        let storage = storage();
        for raw in ["{not json", "42", r#"{"id":"a"}"#, "null"] {
            storage.backend().set_item(DEFAULT_STORAGE_KEY, raw).unwrap();
            assert!(storage.load().unwrap().is_empty(), "raw = {raw}");
        }
    }

    #[test]
    fn malformed_records_are_dropped() {
        let raw = r#"[
            {"id": "a", "description": "ok", "completed": true,
             "createdAt": "t", "updatedAt": "t", "extra": 1},
            {"id": "b", "description": "no completed", "createdAt": "t", "updatedAt": "t"},
            {"id": 3, "description": "numeric id", "completed": false,
             "createdAt": "t", "updatedAt": "t"},
            "just a string"
        ]"#;
        let tasks = parse_tasks(raw);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "a");
    }

    #[test]
    fn clear_removes_the_key() {
        let storage = storage();
        storage.save(&[task("a", "t")]).unwrap();
        storage.clear().unwrap();
        assert_eq!(storage.backend().get_item(DEFAULT_STORAGE_KEY).unwrap(), None);
        // clearing an empty medium is fine
        storage.clear().unwrap();
    }

    #[test]
    fn custom_key_is_used() {
        let storage = storage().with_key("other");
        storage.save(&[]).unwrap();
        assert_eq!(storage.key(), "other");
        assert_eq!(storage.backend().get_item("other").unwrap().as_deref(), Some("[]"));
        assert_eq!(storage.backend().get_item(DEFAULT_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn medium_failures_map_to_storage_errors() {
        let storage = TaskStorage::new(FaultyBackend::new(MemoryStorage::new().open_tab()));
        let backend = storage.backend();

        backend.inject(StorageOperation::Read, Fault::Unavailable, FaultMode::Once);
        let err = storage.load().unwrap_err();
        assert_eq!(err.operation(), Some(StorageOperation::Read));
        assert!(std::error::Error::source(&err).is_some());

        backend.inject(StorageOperation::Write, Fault::QuotaExceeded, FaultMode::Once);
        let err = storage.save(&[]).unwrap_err();
        assert_eq!(err.to_string(), "Storage quota exceeded");
        assert!(err.is_quota_exceeded());

        backend.inject(StorageOperation::Delete, Fault::Io, FaultMode::Once);
        let err = storage.clear().unwrap_err();
        assert_eq!(err.operation(), Some(StorageOperation::Delete));
        assert!(err.to_string().starts_with("Storage delete operation failed"));
    }

    #[test]
    fn subscription_delivers_sorted_external_changes() {
        let medium = MemoryStorage::new();
        let mine = TaskStorage::new(medium.open_tab());
        let theirs = TaskStorage::new(medium.open_tab());

        let seen: Arc<Mutex<Vec<Vec<Task>>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let _subscription = mine.subscribe(move |tasks| sink.lock().push(tasks));

        theirs
            .save(&[
                task("a", "2025-01-01T00:00:00.000Z"),
                task("b", "2025-01-02T00:00:00.000Z"),
            ])
            .unwrap();
        // own writes and other keys are ignored
        mine.save(&[]).unwrap();
        medium.open_tab().set_item("unrelated", "x").unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        let ids: Vec<&str> = seen[0].iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn dropping_the_subscription_unregisters() {
        let medium = MemoryStorage::new();
        let mine = TaskStorage::new(medium.open_tab());
        let subscription = mine.subscribe(|_tasks| {});
        assert_eq!(medium.listener_count(), 1);
        drop(subscription);
        assert_eq!(medium.listener_count(), 0);

        let subscription = mine.subscribe(|_tasks| {});
        assert!(subscription.id().is_some());
        assert!(subscription.unsubscribe());
        assert_eq!(medium.listener_count(), 0);
    }

    #[test]
    fn reload_failure_skips_the_callback() {
        let medium = MemoryStorage::new();
        let mine = TaskStorage::new(FaultyBackend::new(medium.open_tab()));
        let theirs = TaskStorage::new(medium.open_tab());

        let calls = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&calls);
        let _subscription = mine.subscribe(move |_tasks| *sink.lock() += 1);

        mine.backend()
            .inject(StorageOperation::Read, Fault::Unavailable, FaultMode::Once);
        theirs.save(&[task("a", "t")]).unwrap();
        assert_eq!(*calls.lock(), 0);

        theirs.save(&[]).unwrap();
        assert_eq!(*calls.lock(), 1);
    }
}
