//! Listener registry shared by all tabs of one medium.
//!
//! [`ChangeHub`] remembers which tab registered each listener so that
//! [`dispatch`](ChangeHub::dispatch) can skip the tab that made the change,
//! mirroring the browser rule that a `storage` event never fires in the
//! document that wrote the value.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::{ListenerId, StorageEvent, StorageListener};

/// Identifies one tab (handle) on a shared medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

struct Registration {
    id: ListenerId,
    origin: TabId,
    listener: StorageListener,
}

/// Registry of change listeners for one medium.
#[derive(Default)]
pub struct ChangeHub {
    next_listener: AtomicU64,
    next_tab: AtomicU64,
    registrations: RwLock<Vec<Registration>>,
}

impl fmt::Debug for ChangeHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeHub")
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

impl ChangeHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh tab identity.
    pub fn open_tab(&self) -> TabId {
        TabId(self.next_tab.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers `listener` on behalf of `origin`.
    pub fn register(&self, origin: TabId, listener: StorageListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.registrations.write().push(Registration {
            id,
            origin,
            listener,
        });
        tracing::trace!(listener = %id, tab = %origin, "registered storage listener");
        id
    }

    /// Removes a listener. Returns `false` if `id` was not registered.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut registrations = self.registrations.write();
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        before != registrations.len()
    }

    /// Delivers `event` to every listener not registered by `origin`.
    ///
    /// Listeners are called after the registry lock is released, so a
    /// listener may itself register, unregister or write to the medium.
    /// Returns the number of listeners called.
    pub fn dispatch(&self, origin: TabId, event: &StorageEvent) -> usize {
        let targets: Vec<StorageListener> = self
            .registrations
            .read()
            .iter()
            .filter(|r| r.origin != origin)
            .map(|r| r.listener.clone())
            .collect();

        for listener in &targets {
            listener(event);
        }
        targets.len()
    }

    /// Number of registered listeners across all tabs.
    pub fn listener_count(&self) -> usize {
        self.registrations.read().len()
    }
}
