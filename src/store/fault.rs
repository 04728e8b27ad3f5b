//! Fault injection for storage media.
//!
//! [`FaultyBackend`] forwards to an inner [`StorageBackend`] until told to
//! fail. Faults are armed per operation, either for the next call only or
//! until [`heal`](FaultyBackend::heal) is called, which is how the error
//! paths of the persistence and service layers are exercised.
//!
//! # Examples
//!
//! ```
//! use tasklist::store::{Fault, FaultMode, FaultyBackend, MemoryStorage, StorageBackend};
//! use tasklist::StorageOperation;
//!
//! let backend = FaultyBackend::new(MemoryStorage::new().open_tab());
//! backend.inject(StorageOperation::Write, Fault::QuotaExceeded, FaultMode::Once);
//!
//! assert!(backend.set_item("k", "v").unwrap_err().is_quota_exceeded());
//! assert!(backend.set_item("k", "v").is_ok());
//! ```

use std::collections::HashMap;

use parking_lot::Mutex;

use super::{BackendError, ListenerId, StorageBackend, StorageListener};
use crate::error::StorageOperation;

/// The kind of failure to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The medium is full.
    QuotaExceeded,
    /// The medium refuses access.
    Unavailable,
    /// An I/O failure underneath the medium.
    Io,
}

impl Fault {
    fn to_error(self, operation: StorageOperation, key: &str) -> BackendError {
        match self {
            Self::QuotaExceeded => {
                BackendError::quota_exceeded(format!("injected quota failure on {key}"))
            },
            Self::Unavailable => {
                BackendError::unavailable(format!("injected {operation} failure on {key}"))
            },
            Self::Io => BackendError::io(
                format!("injected {operation} failure on {key}"),
                std::io::Error::other("simulated i/o error"),
            ),
        }
    }
}

/// How long an injected fault stays armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultMode {
    /// Fail the next call, then recover.
    Once,
    /// Fail every call until healed.
    Always,
}

/// A backend wrapper that fails on demand.
#[derive(Debug)]
pub struct FaultyBackend<B> {
    inner: B,
    armed: Mutex<HashMap<StorageOperation, (Fault, FaultMode)>>,
}

impl<B: StorageBackend> FaultyBackend<B> {
    /// Wraps `inner` with no faults armed.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            armed: Mutex::new(HashMap::new()),
        }
    }

    /// Arms `fault` for `operation`, replacing any fault already armed for it.
    pub fn inject(&self, operation: StorageOperation, fault: Fault, mode: FaultMode) {
        self.armed.lock().insert(operation, (fault, mode));
    }

    /// Disarms every fault.
    pub fn heal(&self) {
        self.armed.lock().clear();
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn trip(&self, operation: StorageOperation, key: &str) -> Result<(), BackendError> {
        let mut armed = self.armed.lock();
        let Some(&(fault, mode)) = armed.get(&operation) else {
            return Ok(());
        };
        if mode == FaultMode::Once {
            armed.remove(&operation);
        }
        tracing::debug!(%operation, key, ?fault, "injecting storage fault");
        Err(fault.to_error(operation, key))
    }
}

impl<B: StorageBackend> StorageBackend for FaultyBackend<B> {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.trip(StorageOperation::Read, key)?;
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.trip(StorageOperation::Write, key)?;
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), BackendError> {
        self.trip(StorageOperation::Delete, key)?;
        self.inner.remove_item(key)
    }

    fn add_listener(&self, listener: StorageListener) -> ListenerId {
        self.inner.add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.remove_listener(id)
    }
}
