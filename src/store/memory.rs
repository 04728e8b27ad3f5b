//! In-memory storage medium.
//!
//! [`MemoryStorage`] is the shared medium (think: one browser profile's
//! `localStorage`); [`MemoryTab`] is a handle on it that implements
//! [`StorageBackend`]. Opening several tabs on one `MemoryStorage` gives
//! the same cross-tab behaviour as several browser tabs on one origin.
//!
//! # Examples
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use tasklist::store::{MemoryStorage, StorageBackend, StorageEvent};
//!
//! let storage = MemoryStorage::new();
//! let first = storage.open_tab();
//! let second = storage.open_tab();
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! second.add_listener(Arc::new(move |event: &StorageEvent| {
//!     sink.lock().unwrap().push(event.key.clone());
//! }));
//!
//! first.set_item("greeting", "hello").unwrap();
//! assert_eq!(second.get_item("greeting").unwrap().as_deref(), Some("hello"));
//! assert_eq!(*seen.lock().unwrap(), vec!["greeting".to_string()]);
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use super::hub::{ChangeHub, TabId};
use super::{BackendError, ListenerId, StorageBackend, StorageEvent, StorageListener};

#[derive(Debug, Default)]
struct MemoryInner {
    data: DashMap<String, String>,
    hub: ChangeHub,
    quota_bytes: Option<usize>,
    // serializes check-then-write so quota accounting and events stay exact
    write_lock: Mutex<()>,
}

/// Shared in-memory medium.
///
/// Cloning is cheap and yields another reference to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<MemoryInner>,
}

impl MemoryStorage {
    /// Creates an empty medium without a quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty medium that rejects writes once the stored keys and
    /// values would exceed `quota_bytes` in total.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                quota_bytes: Some(quota_bytes),
                ..MemoryInner::default()
            }),
        }
    }

    /// Opens a new tab on this medium.
    pub fn open_tab(&self) -> MemoryTab {
        MemoryTab {
            storage: self.clone(),
            origin: self.inner.hub.open_tab(),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.data.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.data.is_empty()
    }

    /// Total bytes of stored keys and values.
    pub fn used_bytes(&self) -> usize {
        self.inner
            .data
            .iter()
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }

    /// The configured quota, if any.
    pub fn quota_bytes(&self) -> Option<usize> {
        self.inner.quota_bytes
    }

    /// Number of listeners registered across all tabs.
    pub fn listener_count(&self) -> usize {
        self.inner.hub.listener_count()
    }

    fn check_quota(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let Some(quota) = self.inner.quota_bytes else {
            return Ok(());
        };
        let others: usize = self
            .inner
            .data
            .iter()
            .filter(|entry| entry.key() != key)
            .map(|entry| entry.key().len() + entry.value().len())
            .sum();
        let needed = others + key.len() + value.len();
        if needed > quota {
            return Err(BackendError::quota_exceeded(format!(
                "writing {key} needs {needed} bytes, limit is {quota}"
            )));
        }
        Ok(())
    }
}

/// A tab on a [`MemoryStorage`].
#[derive(Debug, Clone)]
pub struct MemoryTab {
    storage: MemoryStorage,
    origin: TabId,
}

impl MemoryTab {
    /// The medium this tab belongs to.
    pub fn storage(&self) -> &MemoryStorage {
        &self.storage
    }

    /// This tab's identity.
    pub fn tab_id(&self) -> TabId {
        self.origin
    }

    fn notify(&self, key: &str, old_value: Option<String>, new_value: Option<String>) {
        if old_value == new_value {
            return;
        }
        let event = StorageEvent {
            key: key.to_string(),
            old_value,
            new_value,
        };
        self.storage.inner.hub.dispatch(self.origin, &event);
    }
}

impl StorageBackend for MemoryTab {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self
            .storage
            .inner
            .data
            .get(key)
            .map(|entry| entry.value().clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let old_value = {
            let _guard = self.storage.inner.write_lock.lock();
            self.storage.check_quota(key, value)?;
            self.storage
                .inner
                .data
                .insert(key.to_string(), value.to_string())
        };
        self.notify(key, old_value, Some(value.to_string()));
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), BackendError> {
        let old_value = {
            let _guard = self.storage.inner.write_lock.lock();
            self.storage.inner.data.remove(key).map(|(_, value)| value)
        };
        self.notify(key, old_value, None);
        Ok(())
    }

    fn add_listener(&self, listener: StorageListener) -> ListenerId {
        self.storage.inner.hub.register(self.origin, listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.storage.inner.hub.unregister(id)
    }
}
