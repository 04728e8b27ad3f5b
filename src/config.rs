//! Configuration for a task list.
//!
//! A [`TaskListConfig`] selects the storage key, an optional byte quota, an
//! optional directory for file-backed storage and the default log filter.
//! It is read from TOML:
//!
//! ```toml
//! storage_key = "todo-app-tasks"
//! quota_bytes = 5242880
//! data_dir = "/var/lib/tasklist"
//! log_filter = "tasklist=debug"
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_STORAGE_KEY;
use crate::store::{BackendError, FileStorage, MemoryStorage};

/// Default `tracing` filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Errors raised while loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has unknown fields.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds an unusable value.
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// The configured storage could not be opened.
    #[error(transparent)]
    Storage(#[from] BackendError),
}

/// Settings for a task list.
///
/// # Examples
///
/// ```
/// use tasklist::TaskListConfig;
///
/// let config = TaskListConfig::from_toml_str(r#"
///     storage_key = "work-tasks"
///     quota_bytes = 1024
/// "#).unwrap();
/// assert_eq!(config.storage_key, "work-tasks");
/// assert_eq!(config.quota_bytes, Some(1024));
/// assert_eq!(config.log_filter, "info");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskListConfig {
    /// Key the collection is stored under.
    pub storage_key: String,

    /// Upper bound on stored bytes. `None` means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_bytes: Option<usize>,

    /// Directory for [`FileStorage`]. Required by
    /// [`open_file_storage`](Self::open_file_storage).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// `tracing` filter directive used when installing a subscriber.
    pub log_filter: String,
}

impl Default for TaskListConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            quota_bytes: None,
            data_dir: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl TaskListConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] if [`validate`](Self::validate) fails.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), key = %config.storage_key, "loaded config");
        Ok(config)
    }

    /// Sets the storage key.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Sets the byte quota.
    pub fn with_quota_bytes(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// Sets the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Sets the log filter directive.
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Checks field values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a blank storage key, a zero
    /// quota or a blank log filter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "storage_key",
                message: "must not be empty".to_string(),
            });
        }
        if self.quota_bytes == Some(0) {
            return Err(ConfigError::Invalid {
                field: "quota_bytes",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "log_filter",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Creates an in-memory medium honouring the quota.
    pub fn memory_storage(&self) -> MemoryStorage {
        match self.quota_bytes {
            Some(quota) => MemoryStorage::with_quota(quota),
            None => MemoryStorage::new(),
        }
    }

    /// Opens a file-backed medium in [`data_dir`](Self::data_dir),
    /// honouring the quota.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if no data directory is configured
    /// and [`ConfigError::Storage`] if it cannot be created.
    pub fn open_file_storage(&self) -> Result<FileStorage, ConfigError> {
        let dir = self.data_dir.as_ref().ok_or_else(|| ConfigError::Invalid {
            field: "data_dir",
            message: "required for file storage".to_string(),
        })?;
        let storage = match self.quota_bytes {
            Some(quota) => FileStorage::open_with_quota(dir, quota)?,
            None => FileStorage::open(dir)?,
        };
        Ok(storage)
    }
}
