//! Storage traits for the document storage abstraction layer.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;
use crate::types::{Query, StoredDocument};

/// The storage trait all document backends must implement.
///
/// Documents are JSON objects carrying their own `id` field; the backend
/// stores them under `collection/id`. Implementations must be thread-safe
/// (`Send + Sync`) because one instance is shared by every in-flight
/// request.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Creates a new document.
    ///
    /// The document must contain a string `id` field.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if a document with the same
    /// collection and id exists, and `StorageError::InvalidDocument` if the
    /// `id` field is missing or not a string.
    async fn create(&self, collection: &str, document: &Value)
    -> Result<StoredDocument, StorageError>;

    /// Reads a document by collection and id.
    ///
    /// Returns `None` if the document does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing
    /// documents.
    async fn read(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<StoredDocument>, StorageError>;

    /// Replaces the content of an existing document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the document does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        document: &Value,
    ) -> Result<StoredDocument, StorageError>;

    /// Deletes a document by collection and id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the document does not exist.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StorageError>;

    /// Finds documents in a collection matching a query.
    ///
    /// # Errors
    ///
    /// Returns an error for infrastructure issues.
    async fn find(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<StoredDocument>, StorageError>;

    /// Finds the first document matching a query, if any.
    ///
    /// # Errors
    ///
    /// Returns an error for infrastructure issues.
    async fn find_one(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Option<StoredDocument>, StorageError> {
        let mut results = self.find(collection, &query.clone().limit(1)).await?;
        Ok(if results.is_empty() {
            None
        } else {
            Some(results.swap_remove(0))
        })
    }

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// Type alias for a shareable storage handle.
pub type DynDocumentStorage = std::sync::Arc<dyn DocumentStorage>;
