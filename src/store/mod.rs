//! Storage medium abstraction and task persistence.
//!
//! # Architecture
//!
//! Persistence has two layers:
//!
//! 1. **[`StorageBackend`]** -- A dumb string key-value medium with change
//!    notifications, shaped after the browser's `localStorage` and its
//!    `storage` event. No task logic lives here.
//!
//! 2. **[`TaskStorage`]** -- Loads, saves and clears the whole task
//!    collection under a single key and turns external change
//!    notifications into refreshed task lists. All corruption handling
//!    lives here.
//!
//! # Tabs
//!
//! A medium is shared by any number of *tabs* (independent handles on the
//! same data, see [`MemoryStorage::open_tab`] and [`FileStorage::open_tab`]).
//! A write through one tab notifies the listeners registered through every
//! other tab, never the writer's own listeners. That is the only
//! cross-tab coordination there is: the last whole-collection write wins.
//!
//! # Backends
//!
//! - [`MemoryStorage`] -- in-process medium on a `DashMap`, with an optional
//!   byte quota.
//! - [`FileStorage`] -- one file per key in a directory, atomic replace on
//!   write.
//! - [`FaultyBackend`] -- wraps another backend and fails on demand.

pub mod fault;
pub mod file;
pub mod hub;
pub mod memory;
pub mod persistence;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub use fault::{Fault, FaultMode, FaultyBackend};
pub use file::{FileStorage, FileTab};
pub use hub::{ChangeHub, TabId};
pub use memory::{MemoryStorage, MemoryTab};
pub use persistence::{parse_tasks, Subscription, TaskStorage};

/// Identifies a registered change listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// A change made to the medium through another tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// The key that changed.
    pub key: String,
    /// Value before the change, `None` if the key was absent.
    pub old_value: Option<String>,
    /// Value after the change, `None` if the key was removed.
    pub new_value: Option<String>,
}

/// Callback invoked for every [`StorageEvent`] raised by another tab.
pub type StorageListener = Arc<dyn Fn(&StorageEvent) + Send + Sync>;

/// Errors reported by a storage medium.
///
/// [`TaskStorage`] maps these to
/// [`TaskError::Storage`](crate::TaskError::Storage), tagged with the
/// operation that failed.
///
/// # Examples
///
/// ```
/// use tasklist::store::BackendError;
///
/// let err = BackendError::quota_exceeded("5242880 byte limit");
/// assert!(err.is_quota_exceeded());
/// assert!(err.to_string().contains("5242880"));
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// The medium is full.
    #[error("QuotaExceededError: {message}")]
    QuotaExceeded {
        /// Human-readable description of the capacity issue.
        message: String,
    },

    /// The medium refused the operation (disabled, locked, private mode).
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the refusal.
        message: String,
    },

    /// An I/O failure underneath the medium.
    #[error("{message}: {source}")]
    Io {
        /// What was being attempted.
        message: String,
        /// The underlying error.
        source: std::io::Error,
    },
}

impl BackendError {
    /// Creates a [`BackendError::QuotaExceeded`].
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::QuotaExceeded {
            message: message.into(),
        }
    }

    /// Creates a [`BackendError::Unavailable`].
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Wraps an I/O error, classifying "disk full" errors as quota failures.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::StorageFull | std::io::ErrorKind::QuotaExceeded => {
                Self::QuotaExceeded {
                    message: format!("{}: {source}", message.into()),
                }
            },
            _ => Self::Io {
                message: message.into(),
                source,
            },
        }
    }

    /// Returns `true` if the medium ran out of space.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// A string key-value medium with cross-tab change notifications.
///
/// Implementations are handles bound to one tab: listeners added through a
/// handle hear about writes made through *other* handles on the same
/// medium. Writes that leave a value unchanged raise no event.
///
/// All operations are synchronous; a call returns once the medium has
/// committed (or rejected) the change.
pub trait StorageBackend: Send + Sync {
    /// Reads the value stored under `key`, `None` if absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Removes `key`. Removing an absent key succeeds.
    fn remove_item(&self, key: &str) -> Result<(), BackendError>;

    /// Registers a listener for changes made through other tabs.
    fn add_listener(&self, listener: StorageListener) -> ListenerId;

    /// Unregisters a listener. Returns `false` if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), BackendError> {
        (**self).remove_item(key)
    }

    fn add_listener(&self, listener: StorageListener) -> ListenerId {
        (**self).add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        (**self).remove_listener(id)
    }
}
