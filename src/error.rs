//! Error taxonomy for task operations.
//!
//! Provides [`TaskError`], the single error type returned by validation,
//! persistence and the task service. Each variant carries a stable
//! machine-readable code (see [`TaskError::code`]) alongside its
//! human-readable message, so callers can branch on the kind without
//! parsing strings.
//!
//! The free-standing classifiers ([`is_validation_error`],
//! [`is_quota_exceeded_error`], ...) accept any `dyn Error` and answer
//! `false` for errors that did not originate here.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    QUOTA_EXCEEDED_MARKER, STORAGE_ERROR_CODE, TASK_NOT_FOUND_CODE, VALIDATION_ERROR_CODE,
};
use crate::store::BackendError;

/// Convenience alias used throughout the crate.
pub type Result<T, E = TaskError> = std::result::Result<T, E>;

/// The storage primitive that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageOperation {
    /// Reading the persisted collection.
    Read,
    /// Writing the persisted collection.
    Write,
    /// Removing the persisted collection.
    Delete,
}

impl StorageOperation {
    /// Lowercase name used in messages and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for StorageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during task operations.
///
/// # Examples
///
/// ```
/// use tasklist::TaskError;
///
/// let err = TaskError::not_found("11111111-1111-4111-8111-111111111111");
/// assert_eq!(err.code(), "TASK_NOT_FOUND");
/// assert!(err.is_not_found());
/// assert!(err.to_string().contains("11111111-1111-4111-8111-111111111111"));
/// ```
#[derive(Debug, Error)]
pub enum TaskError {
    /// Caller supplied input that failed a validation check.
    #[error("{message}")]
    Validation {
        /// The offending input field (`"description"`, `"id"`, ...).
        field: String,
        /// Human-readable explanation.
        message: String,
    },

    /// The targeted identifier is absent from the collection.
    #[error("Task not found: {task_id}")]
    NotFound {
        /// The identifier that was looked up.
        task_id: String,
    },

    /// The storage medium failed.
    #[error("{message}")]
    Storage {
        /// Which primitive failed.
        operation: StorageOperation,
        /// Human-readable explanation. Contains `"quota exceeded"` when the
        /// medium ran out of space.
        message: String,
        /// The failure reported by the medium, when there was one.
        source: Option<BackendError>,
    },
}

impl TaskError {
    /// Creates a [`TaskError::Validation`] for `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a [`TaskError::NotFound`] for `task_id`.
    pub fn not_found(task_id: impl Into<String>) -> Self {
        Self::NotFound {
            task_id: task_id.into(),
        }
    }

    /// Creates a [`TaskError::Storage`] for a failed `operation`.
    ///
    /// A capacity failure from the medium collapses to the fixed message
    /// `"Storage quota exceeded"`; any other cause is appended to the
    /// generic `"Storage {operation} operation failed"` message.
    ///
    /// # Examples
    ///
    /// ```
    /// use tasklist::store::BackendError;
    /// use tasklist::{StorageOperation, TaskError};
    ///
    /// let err = TaskError::storage(
    ///     StorageOperation::Write,
    ///     Some(BackendError::quota_exceeded("5 MB limit")),
    /// );
    /// assert_eq!(err.to_string(), "Storage quota exceeded");
    /// assert!(err.is_quota_exceeded());
    ///
    /// let err = TaskError::storage(StorageOperation::Delete, None);
    /// assert_eq!(err.to_string(), "Storage delete operation failed");
    /// ```
    pub fn storage(operation: StorageOperation, cause: Option<BackendError>) -> Self {
        let message = match &cause {
            Some(BackendError::QuotaExceeded { .. }) => "Storage quota exceeded".to_string(),
            Some(other) => format!("Storage {operation} operation failed: {other}"),
            None => format!("Storage {operation} operation failed"),
        };
        Self::Storage {
            operation,
            message,
            source: cause,
        }
    }

    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => VALIDATION_ERROR_CODE,
            Self::NotFound { .. } => TASK_NOT_FOUND_CODE,
            Self::Storage { .. } => STORAGE_ERROR_CODE,
        }
    }

    /// The invalid field, for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// The missing identifier, for not-found errors.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::NotFound { task_id } => Some(task_id),
            _ => None,
        }
    }

    /// The failed primitive, for storage errors.
    pub fn operation(&self) -> Option<StorageOperation> {
        match self {
            Self::Storage { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    /// Returns `true` for [`TaskError::Validation`].
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns `true` for [`TaskError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for [`TaskError::Storage`].
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    /// Returns `true` for a storage error caused by capacity exhaustion.
    ///
    /// Decided on the message alone so that errors rebuilt from a serialized
    /// form still classify correctly.
    pub fn is_quota_exceeded(&self) -> bool {
        match self {
            Self::Storage { message, .. } => message
                .to_ascii_lowercase()
                .contains(QUOTA_EXCEEDED_MARKER),
            _ => false,
        }
    }
}

fn as_task_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a TaskError> {
    err.downcast_ref::<TaskError>()
}

/// Returns `true` if `err` is a [`TaskError::Validation`].
pub fn is_validation_error(err: &(dyn StdError + 'static)) -> bool {
    as_task_error(err).is_some_and(TaskError::is_validation)
}

/// Returns `true` if `err` is a [`TaskError::NotFound`].
pub fn is_not_found_error(err: &(dyn StdError + 'static)) -> bool {
    as_task_error(err).is_some_and(TaskError::is_not_found)
}

/// Returns `true` if `err` is a [`TaskError::Storage`].
pub fn is_storage_error(err: &(dyn StdError + 'static)) -> bool {
    as_task_error(err).is_some_and(TaskError::is_storage)
}

/// Returns `true` if `err` is a storage error caused by capacity exhaustion.
///
/// # Examples
///
/// ```
/// use tasklist::error::is_quota_exceeded_error;
///
/// let unrelated = std::io::Error::other("disk on fire");
/// assert!(!is_quota_exceeded_error(&unrelated));
/// ```
pub fn is_quota_exceeded_error(err: &(dyn StdError + 'static)) -> bool {
    as_task_error(err).is_some_and(TaskError::is_quota_exceeded)
}
