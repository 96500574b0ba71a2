//! In-memory document storage backend for the Airpower server.
//!
//! This crate provides an in-memory implementation of the
//! [`DocumentStorage`] trait from `airpower-storage`, using a concurrent
//! hash map keyed `"collection/id"`. It is the default backend and the one
//! every test suite runs against.
//!
//! # Example
//!
//! ```ignore
//! use airpower_db_memory::InMemoryStorage;
//! use airpower_storage::DocumentStorage;
//!
//! let storage = InMemoryStorage::new();
//! let budget = serde_json::json!({ "id": "b1", "owner_id": "u1", "name": "Power" });
//! let created = storage.create("budgets", &budget).await?;
//! ```

pub mod storage;

pub use airpower_storage::{DocumentStorage, DynDocumentStorage, StorageError, StoredDocument};
pub use storage::InMemoryStorage;

/// Creates a new shareable in-memory storage handle.
#[must_use]
pub fn create_storage() -> DynDocumentStorage {
    std::sync::Arc::new(InMemoryStorage::new())
}
