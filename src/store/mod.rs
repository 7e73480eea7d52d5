mod json;
mod memory;

use crate::types::Collection;
use async_trait::async_trait;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A stored document. The store is schema-agnostic; the coordinator owns the
/// record shapes and only relies on the `id` field being a string.
pub type Document = serde_json::Value;

/// Errors that can occur against the backing store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt document data: {0}")]
    Corrupt(String),

    #[error("document has no string 'id' field")]
    MissingId,
}

/// Persistent document collection contract.
///
/// Implementations must preserve insertion order in `scan` and treat `update`
/// of an unknown id as a no-op returning `false`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Append a new document to a collection.
    async fn insert(&self, collection: Collection, doc: Document) -> StoreResult<()>;

    /// Fetch a single document by id.
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>>;

    /// Replace an existing document in place (matched by id).
    /// Returns false if no document with that id exists.
    async fn update(&self, collection: Collection, doc: Document) -> StoreResult<bool>;

    /// Remove a document by id. Returns false if it did not exist.
    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<bool>;

    /// Full ordered read of a collection, in insertion order.
    async fn scan(&self, collection: Collection) -> StoreResult<Vec<Document>>;
}

/// Extract the required string id from a document.
pub(crate) fn doc_id(doc: &Document) -> StoreResult<&str> {
    doc.get("id")
        .and_then(|v| v.as_str())
        .ok_or(StoreError::MissingId)
}
