//! Storage key, field limits and error codes shared across the crate.

/// Key under which the whole task collection is stored.
///
/// Kept identical to the key used by the browser build so that an existing
/// `localStorage` dump can be loaded without conversion.
pub const DEFAULT_STORAGE_KEY: &str = "todo-app-tasks";

/// Maximum description length in characters, measured after trimming.
pub const MAX_DESCRIPTION_LENGTH: usize = 100;

/// Error code carried by [`TaskError::Validation`](crate::TaskError::Validation).
pub const VALIDATION_ERROR_CODE: &str = "VALIDATION_ERROR";

/// Error code carried by [`TaskError::NotFound`](crate::TaskError::NotFound).
pub const TASK_NOT_FOUND_CODE: &str = "TASK_NOT_FOUND";

/// Error code carried by [`TaskError::Storage`](crate::TaskError::Storage).
pub const STORAGE_ERROR_CODE: &str = "STORAGE_ERROR";

/// Substring that identifies a capacity failure in a storage error message.
pub const QUOTA_EXCEEDED_MARKER: &str = "quota exceeded";
