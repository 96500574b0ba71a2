//! Document storage abstraction layer for the Airpower server.
//!
//! This crate defines the contract between the HTTP layer and whatever
//! document database backs it. Backends implement [`DocumentStorage`];
//! the in-memory implementation lives in `airpower-db-memory`.
//!
//! # Example
//!
//! ```ignore
//! use airpower_storage::{DocumentStorage, Query, StorageError};
//!
//! async fn owned_budgets(
//!     storage: &dyn DocumentStorage,
//!     owner: &str,
//! ) -> Result<Vec<airpower_storage::StoredDocument>, StorageError> {
//!     storage.find("budgets", &Query::new().owner(owner)).await
//! }
//! ```

pub mod error;
pub mod traits;
pub mod types;

pub use error::StorageError;
pub use traits::{DocumentStorage, DynDocumentStorage};
pub use types::{Query, SortOrder, StoredDocument};
