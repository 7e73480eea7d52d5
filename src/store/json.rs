//! JSON-file document store
//!
//! One JSON array file per collection under a data directory, with the live
//! copy cached in memory. Writes rewrite the whole file through a temp file
//! plus rename so a crash mid-write never leaves a torn collection on disk.

use super::{doc_id, Document, DocumentStore, StoreError, StoreResult};
use crate::types::Collection;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

pub struct JsonFileStore {
    dir: PathBuf,
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl JsonFileStore {
    /// Open (or initialize) a store rooted at `dir`. Existing collection
    /// files are loaded; a missing file is an empty collection.
    pub async fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut collections = HashMap::new();
        for collection in Collection::ALL {
            let path = dir.join(format!("{}.json", collection.name()));
            let docs = match fs::read_to_string(&path).await {
                Ok(content) => serde_json::from_str::<Vec<Document>>(&content).map_err(|e| {
                    StoreError::Corrupt(format!("{}: {}", path.display(), e))
                })?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
                Err(e) => return Err(StoreError::Unavailable(e.to_string())),
            };
            tracing::info!("Loaded {} documents from {}", docs.len(), collection);
            collections.insert(collection, docs);
        }

        Ok(Self {
            dir,
            collections: RwLock::new(collections),
        })
    }

    fn collection_path(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.name()))
    }

    /// Atomic rewrite: temp file in the same directory, then rename.
    async fn persist(&self, collection: Collection, docs: &[Document]) -> StoreResult<()> {
        let path = self.collection_path(collection);
        let tmp = path.with_extension("json.tmp");

        let content = serde_json::to_string_pretty(docs)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        fs::write(&tmp, content)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn insert(&self, collection: Collection, doc: Document) -> StoreResult<()> {
        doc_id(&doc)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        docs.push(doc);
        self.persist(collection, docs).await
    }

    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| doc_id(d).is_ok_and(|i| i == id)))
            .cloned())
    }

    async fn update(&self, collection: Collection, doc: Document) -> StoreResult<bool> {
        let id = doc_id(&doc)?.to_string();
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        let Some(slot) = docs.iter_mut().find(|d| doc_id(d).is_ok_and(|i| i == id)) else {
            return Ok(false);
        };
        *slot = doc;
        self.persist(collection, docs).await?;
        Ok(true)
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        let before = docs.len();
        docs.retain(|d| doc_id(d).map(|i| i != id).unwrap_or(true));
        if docs.len() == before {
            return Ok(false);
        }
        self.persist(collection, docs).await?;
        Ok(true)
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
