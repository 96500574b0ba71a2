//! Storage types for the document storage abstraction layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// A document as stored in the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// The document id.
    pub id: String,
    /// The collection the document belongs to.
    pub collection: String,
    /// The full document content as JSON.
    pub document: Value,
    /// When the document was originally created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the document was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl StoredDocument {
    /// Creates a new `StoredDocument`.
    #[must_use]
    pub fn new(id: impl Into<String>, collection: impl Into<String>, document: Value) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: id.into(),
            collection: collection.into(),
            document,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy with replaced content and a bumped `updated_at`.
    #[must_use]
    pub fn with_document(&self, document: Value) -> Self {
        Self {
            id: self.id.clone(),
            collection: self.collection.clone(),
            document,
            created_at: self.created_at,
            updated_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Sort order for `find` results, by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Newest first (the default for list endpoints).
    #[default]
    CreatedDesc,
    /// Oldest first.
    CreatedAsc,
}

/// A query over a collection.
///
/// Filters are exact-match comparisons against top-level document fields.
/// The owner filter is a shorthand for `owner_id` equality and is applied
/// by every owner-scoped endpoint.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Restrict to documents whose `owner_id` field equals this value.
    pub owner: Option<String>,
    /// Exact-match filters on top-level fields.
    pub filters: Vec<(String, Value)>,
    /// Sort order by creation time.
    pub sort: SortOrder,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates a new empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to one owner.
    #[must_use]
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Adds an exact-match filter on a top-level field.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Sets the sort order.
    #[must_use]
    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Caps the number of returned documents.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` if the given document content matches this query.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        if let Some(ref owner) = self.owner {
            if document.get("owner_id").and_then(Value::as_str) != Some(owner.as_str()) {
                return false;
            }
        }
        self.filters
            .iter()
            .all(|(field, value)| document.get(field) == Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_matches_owner_and_filters() {
        let doc = json!({"owner_id": "u1", "category": "Food", "archived": false});

        assert!(Query::new().matches(&doc));
        assert!(Query::new().owner("u1").matches(&doc));
        assert!(!Query::new().owner("u2").matches(&doc));
        assert!(Query::new()
            .owner("u1")
            .filter("category", "Food")
            .matches(&doc));
        assert!(!Query::new().filter("category", "Transport").matches(&doc));
        assert!(Query::new().filter("archived", false).matches(&doc));
    }

    #[test]
    fn with_document_preserves_created_at() {
        let stored = StoredDocument::new("d1", "budgets", json!({"a": 1}));
        let updated = stored.with_document(json!({"a": 2}));
        assert_eq!(updated.created_at, stored.created_at);
        assert_eq!(updated.document["a"], 2);
        assert!(updated.updated_at >= stored.updated_at);
    }
}
