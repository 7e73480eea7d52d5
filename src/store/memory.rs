use super::{doc_id, Document, DocumentStore, StoreResult};
use crate::types::Collection;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory document store. Used in tests and when no data directory is
/// wanted; contents are lost on shutdown.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: Collection, doc: Document) -> StoreResult<()> {
        doc_id(&doc)?;
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(doc);
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        let docs = match collections.get(&collection) {
            Some(docs) => docs,
            None => return Ok(None),
        };
        Ok(docs
            .iter()
            .find(|d| doc_id(d).is_ok_and(|i| i == id))
            .cloned())
    }

    async fn update(&self, collection: Collection, doc: Document) -> StoreResult<bool> {
        let id = doc_id(&doc)?.to_string();
        let mut collections = self.collections.write().await;
        let docs = match collections.get_mut(&collection) {
            Some(docs) => docs,
            None => return Ok(false),
        };
        match docs.iter_mut().find(|d| doc_id(d).is_ok_and(|i| i == id)) {
            Some(slot) => {
                *slot = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let docs = match collections.get_mut(&collection) {
            Some(docs) => docs,
            None => return Ok(false),
        };
        let before = docs.len();
        docs.retain(|d| doc_id(d).map(|i| i != id).unwrap_or(true));
        Ok(docs.len() != before)
    }

    async fn scan(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default())
    }
}
