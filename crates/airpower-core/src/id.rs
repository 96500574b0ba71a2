//! Document id generation.

/// Generates a new random document id (UUID v4, hyphenated).
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
