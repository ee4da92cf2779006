//! UUID utilities

use uuid::Uuid;

/// Generate a new UUIDv4 in its hyphenated string form
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
