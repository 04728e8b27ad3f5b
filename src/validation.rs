//! Input validation for task descriptions, identifiers and timestamps.
//!
//! Every function here is pure: it either returns the normalized value or a
//! [`TaskError::Validation`] naming the offending field. The `*_from_value`
//! variants accept untyped JSON input (for callers that receive requests as
//! [`serde_json::Value`]) and additionally reject non-string / non-boolean
//! values.

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat};
use regex::Regex;
use serde_json::Value;

use crate::constants::MAX_DESCRIPTION_LENGTH;
use crate::error::{Result, TaskError};

static UUID_V4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("UUID v4 pattern is a valid regex")
});

/// Trims whitespace and the byte order mark, which `str::trim` keeps.
fn trim_blank(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Validates and trims a task description.
///
/// Trimming happens before the length check, so padding around an
/// otherwise valid description is accepted. Length is counted in
/// characters, not bytes.
///
/// # Examples
///
/// ```
/// use tasklist::validation::validate_description;
///
/// assert_eq!(validate_description("  Buy milk  ").unwrap(), "Buy milk");
/// assert!(validate_description("   ").is_err());
/// assert!(validate_description(&"x".repeat(101)).is_err());
/// ```
pub fn validate_description(raw: &str) -> Result<String> {
    let trimmed = trim_blank(raw);

    if trimmed.is_empty() {
        return Err(TaskError::validation(
            "description",
            "Description cannot be empty",
        ));
    }

    if trimmed.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(TaskError::validation(
            "description",
            format!("Description must be {MAX_DESCRIPTION_LENGTH} characters or less"),
        ));
    }

    Ok(trimmed.to_string())
}

/// Validates a task identifier against the UUID v4 textual format.
///
/// The identifier is returned verbatim (not trimmed or case-folded).
///
/// # Examples
///
/// ```
/// use tasklist::validation::validate_id;
///
/// assert!(validate_id("11111111-1111-4111-8111-111111111111").is_ok());
/// assert!(validate_id("11111111-1111-1111-1111-111111111111").is_err());
/// assert!(validate_id("").is_err());
/// ```
pub fn validate_id(raw: &str) -> Result<String> {
    if trim_blank(raw).is_empty() {
        return Err(TaskError::validation("id", "Task ID cannot be empty"));
    }

    if !UUID_V4.is_match(raw) {
        return Err(TaskError::validation("id", "Task ID must be a valid UUID"));
    }

    Ok(raw.to_string())
}

/// Returns `true` if `raw` passes [`validate_id`].
pub fn is_valid_id(raw: &str) -> bool {
    validate_id(raw).is_ok()
}

/// Validates a description received as untyped JSON.
pub fn description_from_value(raw: &Value) -> Result<String> {
    match raw {
        Value::String(s) => validate_description(s),
        _ => Err(TaskError::validation(
            "description",
            "Description must be a string",
        )),
    }
}

/// Validates an identifier received as untyped JSON.
pub fn id_from_value(raw: &Value) -> Result<String> {
    match raw {
        Value::String(s) => validate_id(s),
        _ => Err(TaskError::validation("id", "Task ID must be a string")),
    }
}

/// Validates a completion flag received as untyped JSON.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tasklist::validation::completed_from_value;
///
/// assert_eq!(completed_from_value(&json!(true)).unwrap(), true);
/// assert!(completed_from_value(&json!("yes")).is_err());
/// ```
pub fn completed_from_value(raw: &Value) -> Result<bool> {
    raw.as_bool().ok_or_else(|| {
        TaskError::validation("completed", "Completed status must be a boolean")
    })
}

/// Validates that `raw` is a canonical ISO-8601 UTC timestamp.
///
/// Canonical means exactly what [`Clock::now_iso`](crate::domain::Clock::now_iso)
/// produces: millisecond precision with a `Z` suffix, e.g.
/// `2025-01-15T10:30:00.000Z`. Other RFC 3339 spellings of the same instant
/// are rejected.
///
/// # Examples
///
/// ```
/// use tasklist::validation::validate_iso_timestamp;
///
/// assert!(validate_iso_timestamp("2025-01-15T10:30:00.000Z", "createdAt").is_ok());
/// assert!(validate_iso_timestamp("2025-01-15T10:30:00Z", "createdAt").is_err());
/// assert!(validate_iso_timestamp("yesterday", "createdAt").is_err());
/// ```
pub fn validate_iso_timestamp(raw: &str, field: &str) -> Result<String> {
    let parsed = DateTime::parse_from_rfc3339(raw).map_err(|_| {
        TaskError::validation(field, format!("{field} must be a valid ISO date string"))
    })?;

    let canonical = parsed
        .to_utc()
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    if canonical != raw {
        return Err(TaskError::validation(
            field,
            format!("{field} must be in ISO 8601 format"),
        ));
    }

    Ok(raw.to_string())
}
