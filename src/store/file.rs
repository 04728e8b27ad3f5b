//! Directory-backed storage medium.
//!
//! Each key is stored in its own file, `{percent-encoded key}.json`, inside
//! the medium's directory. Writes go to a temporary file in the same
//! directory which then replaces the target, so a reader never sees a
//! half-written collection.
//!
//! Change notifications reach tabs opened from the same [`FileStorage`]
//! value (or its clones). Other processes writing the same directory are
//! not observed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use super::hub::{ChangeHub, TabId};
use super::{BackendError, ListenerId, StorageBackend, StorageEvent, StorageListener};

const FILE_EXTENSION: &str = "json";

#[derive(Debug)]
struct FileInner {
    dir: PathBuf,
    hub: ChangeHub,
    quota_bytes: Option<usize>,
    write_lock: Mutex<()>,
}

/// Shared directory-backed medium.
#[derive(Debug, Clone)]
pub struct FileStorage {
    inner: Arc<FileInner>,
}

impl FileStorage {
    /// Opens (creating if needed) a medium rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
        Self::open_inner(dir.into(), None)
    }

    /// Opens a medium that rejects writes once the stored files would
    /// exceed `quota_bytes` in total.
    pub fn open_with_quota(
        dir: impl Into<PathBuf>,
        quota_bytes: usize,
    ) -> Result<Self, BackendError> {
        Self::open_inner(dir.into(), Some(quota_bytes))
    }

    fn open_inner(dir: PathBuf, quota_bytes: Option<usize>) -> Result<Self, BackendError> {
        fs::create_dir_all(&dir).map_err(|e| {
            BackendError::io(format!("failed to create {}", dir.display()), e)
        })?;
        tracing::debug!(dir = %dir.display(), ?quota_bytes, "opened file storage");
        Ok(Self {
            inner: Arc::new(FileInner {
                dir,
                hub: ChangeHub::new(),
                quota_bytes,
                write_lock: Mutex::new(()),
            }),
        })
    }

    /// Opens a new tab on this medium.
    pub fn open_tab(&self) -> FileTab {
        FileTab {
            storage: self.clone(),
            origin: self.inner.hub.open_tab(),
        }
    }

    /// The directory holding the stored files.
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    /// The file that holds `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.inner
            .dir
            .join(format!("{}.{FILE_EXTENSION}", urlencoding::encode(key)))
    }

    /// Reads the stored value. Bytes that are not UTF-8 come back with
    /// replacement characters so callers see unparsable text, not an error.
    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(match String::from_utf8(bytes) {
                Ok(contents) => contents,
                Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BackendError::io(
                format!("failed to read {}", path.display()),
                e,
            )),
        }
    }

    fn used_bytes_excluding(&self, skip: &Path) -> Result<usize, BackendError> {
        let entries = fs::read_dir(&self.inner.dir).map_err(|e| {
            BackendError::io(format!("failed to list {}", self.inner.dir.display()), e)
        })?;

        let mut total = 0usize;
        for entry in entries {
            let entry = entry.map_err(|e| BackendError::io("failed to list storage entry", e))?;
            let path = entry.path();
            if path == skip || path.extension().and_then(|e| e.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            let len = entry
                .metadata()
                .map_err(|e| BackendError::io(format!("failed to stat {}", path.display()), e))?
                .len();
            total += usize::try_from(len).unwrap_or(usize::MAX);
        }
        Ok(total)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let path = self.path_for(key);

        if let Some(quota) = self.inner.quota_bytes {
            let needed = self.used_bytes_excluding(&path)? + value.len();
            if needed > quota {
                return Err(BackendError::quota_exceeded(format!(
                    "writing {} needs {needed} bytes, limit is {quota}",
                    path.display()
                )));
            }
        }

        let mut tmp = NamedTempFile::new_in(&self.inner.dir).map_err(|e| {
            BackendError::io(format!("failed to create temp file for {key}"), e)
        })?;
        tmp.write_all(value.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| BackendError::io(format!("failed to write {key}"), e))?;
        tmp.persist(&path).map_err(|e| {
            BackendError::io(format!("failed to replace {}", path.display()), e.error)
        })?;
        Ok(())
    }

    /// The value being replaced, for the change event. A failed read must
    /// not block the write, so it is reported as absent.
    fn previous(&self, key: &str) -> Option<String> {
        self.read(key).unwrap_or_else(|e| {
            tracing::debug!(key, error = %e, "previous value unreadable");
            None
        })
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackendError::io(
                format!("failed to remove {}", path.display()),
                e,
            )),
        }
    }
}

/// A tab on a [`FileStorage`].
#[derive(Debug, Clone)]
pub struct FileTab {
    storage: FileStorage,
    origin: TabId,
}

impl FileTab {
    /// The medium this tab belongs to.
    pub fn storage(&self) -> &FileStorage {
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

impl StorageBackend for FileTab {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.storage.read(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let old_value = {
            let _guard = self.storage.inner.write_lock.lock();
            let old_value = self.storage.previous(key);
            self.storage.write(key, value)?;
            old_value
        };
        self.notify(key, old_value, Some(value.to_string()));
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), BackendError> {
        let old_value = {
            let _guard = self.storage.inner.write_lock.lock();
            let old_value = self.storage.previous(key);
            self.storage.remove(key)?;
            old_value
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
