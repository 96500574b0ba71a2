//! Concurrent in-memory document store.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use airpower_storage::{DocumentStorage, Query, SortOrder, StorageError, StoredDocument};

/// Storage key, formatted `"collection/id"`.
pub type StorageKey = String;

fn make_storage_key(collection: &str, id: &str) -> StorageKey {
    format!("{collection}/{id}")
}

fn document_id(document: &Value) -> Result<&str, StorageError> {
    document
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StorageError::invalid_document("document must carry a string 'id' field"))
}

/// In-memory document storage backend.
///
/// Uses a `DashMap` for lock-free-ish concurrent access; every stored entry
/// is an independent document, so no cross-key coordination is needed.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    data: DashMap<StorageKey, StoredDocument>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Number of documents across all collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no documents are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl DocumentStorage for InMemoryStorage {
    async fn create(
        &self,
        collection: &str,
        document: &Value,
    ) -> Result<StoredDocument, StorageError> {
        let id = document_id(document)?;
        let key = make_storage_key(collection, id);
        if self.data.contains_key(&key) {
            return Err(StorageError::already_exists(collection, id));
        }
        let stored = StoredDocument::new(id, collection, document.clone());
        self.data.insert(key, stored.clone());
        Ok(stored)
    }

    async fn read(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<StoredDocument>, StorageError> {
        let key = make_storage_key(collection, id);
        Ok(self.data.get(&key).map(|entry| entry.value().clone()))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        document: &Value,
    ) -> Result<StoredDocument, StorageError> {
        let key = make_storage_key(collection, id);
        match self.data.get_mut(&key) {
            Some(mut entry) => {
                let updated = entry.value().with_document(document.clone());
                *entry.value_mut() = updated.clone();
                Ok(updated)
            }
            None => Err(StorageError::not_found(collection, id)),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StorageError> {
        let key = make_storage_key(collection, id);
        match self.data.remove(&key) {
            Some(_) => Ok(()),
            None => Err(StorageError::not_found(collection, id)),
        }
    }

    async fn find(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<StoredDocument>, StorageError> {
        let prefix = format!("{collection}/");
        let mut results: Vec<StoredDocument> = self
            .data
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix))
            .filter(|entry| query.matches(&entry.value().document))
            .map(|entry| entry.value().clone())
            .collect();

        match query.sort {
            SortOrder::CreatedDesc => results.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::CreatedAsc => results.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        }
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, owner: &str, category: &str) -> Value {
        json!({ "id": id, "owner_id": owner, "category": category })
    }

    #[tokio::test]
    async fn create_read_round_trip() {
        let storage = InMemoryStorage::new();
        let created = storage.create("budgets", &doc("b1", "u1", "Food")).await.unwrap();
        assert_eq!(created.id, "b1");
        assert_eq!(created.collection, "budgets");

        let read = storage.read("budgets", "b1").await.unwrap().unwrap();
        assert_eq!(read.document["category"], "Food");
    }

    #[tokio::test]
    async fn create_rejects_duplicates_and_missing_id() {
        let storage = InMemoryStorage::new();
        storage.create("budgets", &doc("b1", "u1", "Food")).await.unwrap();

        let err = storage
            .create("budgets", &doc("b1", "u1", "Food"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists { .. }));

        let err = storage.create("budgets", &json!({"name": "x"})).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidDocument { .. }));
    }

    #[tokio::test]
    async fn same_id_in_different_collections_is_fine() {
        let storage = InMemoryStorage::new();
        storage.create("budgets", &doc("x", "u1", "Food")).await.unwrap();
        storage.create("readings", &doc("x", "u1", "Food")).await.unwrap();
        assert_eq!(storage.len(), 2);
    }

    #[tokio::test]
    async fn update_replaces_content_and_keeps_created_at() {
        let storage = InMemoryStorage::new();
        let created = storage.create("budgets", &doc("b1", "u1", "Food")).await.unwrap();

        let updated = storage
            .update("budgets", "b1", &doc("b1", "u1", "Transport"))
            .await
            .unwrap();
        assert_eq!(updated.document["category"], "Transport");
        assert_eq!(updated.created_at, created.created_at);

        let err = storage
            .update("budgets", "missing", &doc("missing", "u1", "Food"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let storage = InMemoryStorage::new();
        storage.create("budgets", &doc("b1", "u1", "Food")).await.unwrap();
        storage.delete("budgets", "b1").await.unwrap();
        assert!(storage.read("budgets", "b1").await.unwrap().is_none());
        assert!(storage.delete("budgets", "b1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn find_filters_by_owner_and_field() {
        let storage = InMemoryStorage::new();
        storage.create("budgets", &doc("b1", "u1", "Food")).await.unwrap();
        storage.create("budgets", &doc("b2", "u1", "Transport")).await.unwrap();
        storage.create("budgets", &doc("b3", "u2", "Food")).await.unwrap();

        let mine = storage
            .find("budgets", &Query::new().owner("u1"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);

        let food = storage
            .find("budgets", &Query::new().owner("u1").filter("category", "Food"))
            .await
            .unwrap();
        assert_eq!(food.len(), 1);
        assert_eq!(food[0].id, "b1");

        let other_collection = storage.find("readings", &Query::new()).await.unwrap();
        assert!(other_collection.is_empty());
    }

    #[tokio::test]
    async fn find_sorts_newest_first_by_default() {
        let storage = InMemoryStorage::new();
        for id in ["b1", "b2", "b3"] {
            storage.create("budgets", &doc(id, "u1", "Food")).await.unwrap();
            // DashMap iteration order is arbitrary; distinct timestamps make
            // the sort observable.
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let results = storage.find("budgets", &Query::new().owner("u1")).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, "b3");
        assert_eq!(results[2].id, "b1");

        let oldest_first = storage
            .find("budgets", &Query::new().owner("u1").sort(SortOrder::CreatedAsc))
            .await
            .unwrap();
        assert_eq!(oldest_first[0].id, "b1");
    }

    #[tokio::test]
    async fn find_one_respects_limit() {
        let storage = InMemoryStorage::new();
        storage.create("users", &json!({"id": "u1", "email": "a@x.io"})).await.unwrap();
        storage.create("users", &json!({"id": "u2", "email": "b@x.io"})).await.unwrap();

        let found = storage
            .find_one("users", &Query::new().filter("email", "b@x.io"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "u2");

        assert!(storage
            .find_one("users", &Query::new().filter("email", "c@x.io"))
            .await
            .unwrap()
            .is_none());
    }
}
