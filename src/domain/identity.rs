//! Task identifier generation.

use uuid::Uuid;

/// Generates a fresh task identifier.
///
/// Identifiers are random (version 4) UUIDs in lowercase hyphenated form,
/// carrying 122 bits of randomness, so collisions within one collection are
/// not a practical concern.
///
/// # Examples
///
/// ```
/// use tasklist::domain::generate_id;
/// use tasklist::validation::is_valid_id;
///
/// let id = generate_id();
/// assert!(is_valid_id(&id));
/// ```
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
