//! Saved recommendation domain model.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{CoreError, Result};
use crate::id::new_id;

/// An energy-saving recommendation a user chose to keep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Document id.
    pub id: String,

    /// Id of the owning user.
    pub owner_id: String,

    /// Short title (required, trimmed).
    pub title: String,

    /// Full recommendation text (required, trimmed).
    pub details: String,

    /// When the document was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the document was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Recommendation {
    /// Creates a new saved recommendation.
    ///
    /// # Errors
    /// Returns a validation error if title or details is empty after
    /// trimming.
    pub fn new(owner_id: impl Into<String>, title: &str, details: &str) -> Result<Self> {
        let title = title.trim();
        let details = details.trim();
        if title.is_empty() {
            return Err(CoreError::validation("title must not be empty"));
        }
        if details.is_empty() {
            return Err(CoreError::validation("details must not be empty"));
        }
        let now = OffsetDateTime::now_utc();
        Ok(Self {
            id: new_id(),
            owner_id: owner_id.into(),
            title: title.to_string(),
            details: details.to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}
