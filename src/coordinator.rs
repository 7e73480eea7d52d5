//! Broadcast coordinator
//!
//! Sole writer path into the document store. Every successful mutation
//! re-reads the full collection and fans the snapshot out to every
//! connected channel; clients never receive deltas. Snapshots therefore
//! always reflect authoritative store state, which is what makes the
//! non-atomic read-after-write window across store awaits harmless: a
//! broadcast may carry more mutations than the one that triggered it,
//! never fewer.

use crate::protocol::ServerMessage;
use crate::store::{Document, DocumentStore, StoreError};
use crate::types::{new_record_id, ChatRecord, Collection, TodoRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Result type for coordinator operations
pub type CoordResult<T> = Result<T, CoordinatorError>;

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// Malformed intent: empty payload or unknown record id. The intent is
    /// dropped and nothing is broadcast.
    #[error("invalid mutation: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Incoming chat message payload, before the coordinator assigns an id.
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub text: String,
    pub username: String,
    pub avatar: String,
    /// Client-supplied timestamp; the coordinator fills in server time
    /// when absent.
    pub time: Option<String>,
}

/// Owns the connected-channel registry (the broadcast sender) and applies
/// mutation intents against the store. Instances are independent, so tests
/// can run several coordinators side by side.
pub struct Coordinator {
    store: Arc<dyn DocumentStore>,
    updates: broadcast::Sender<ServerMessage>,
}

impl Coordinator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (updates, _rx) = broadcast::channel(100);
        Self { store, updates }
    }

    /// Register a channel for snapshot fan-out. Dropping the receiver
    /// deregisters it; a dead channel never aborts the fan-out to the rest.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.updates.subscribe()
    }

    /// Number of currently connected channels.
    pub fn connected_channels(&self) -> usize {
        self.updates.receiver_count()
    }

    /// Snapshots for a newly connected channel. A store read failure is
    /// logged and degraded to an empty snapshot; it must never refuse the
    /// connection.
    pub async fn initial_snapshots(&self) -> Vec<ServerMessage> {
        let mut snapshots = Vec::with_capacity(Collection::ALL.len());
        for collection in Collection::ALL {
            match self.snapshot(collection).await {
                Ok(msg) => snapshots.push(msg),
                Err(e) => {
                    tracing::warn!("Initial {} snapshot failed: {}", collection, e);
                    snapshots.push(empty_snapshot(collection));
                }
            }
        }
        snapshots
    }

    /// Current todo list, newest first.
    pub async fn todos(&self) -> CoordResult<Vec<TodoRecord>> {
        let mut todos: Vec<TodoRecord> = self.read_collection(Collection::Todos).await?;
        todos.reverse();
        Ok(todos)
    }

    /// Current chat log, oldest first.
    pub async fn chat_log(&self) -> CoordResult<Vec<ChatRecord>> {
        self.read_collection(Collection::Chat).await
    }

    /// Full authoritative snapshot of one collection.
    pub async fn snapshot(&self, collection: Collection) -> CoordResult<ServerMessage> {
        Ok(match collection {
            Collection::Todos => ServerMessage::TodosUpdate {
                todos: self.todos().await?,
            },
            Collection::Chat => ServerMessage::ChatUpdate {
                messages: self.chat_log().await?,
            },
        })
    }

    /// Re-read a collection and fan it out to every connected channel.
    pub async fn broadcast_all(&self, collection: Collection) -> CoordResult<()> {
        let snapshot = self.snapshot(collection).await?;
        // No receivers connected is fine
        let _ = self.updates.send(snapshot);
        Ok(())
    }

    pub async fn add_todo(&self, text: &str) -> CoordResult<TodoRecord> {
        let text = non_empty(text, "todo text")?;
        let todo = TodoRecord {
            id: new_record_id(),
            text,
            completed: false,
        };

        self.store
            .insert(Collection::Todos, to_doc(&todo)?)
            .await?;
        self.broadcast_all(Collection::Todos).await?;
        Ok(todo)
    }

    pub async fn toggle_todo(&self, id: &str) -> CoordResult<TodoRecord> {
        let mut todo = self.require_todo(id).await?;
        todo.completed = !todo.completed;
        self.write_todo_back(todo).await
    }

    pub async fn update_todo(&self, id: &str, text: &str) -> CoordResult<TodoRecord> {
        let text = non_empty(text, "todo text")?;
        let mut todo = self.require_todo(id).await?;
        todo.text = text;
        self.write_todo_back(todo).await
    }

    /// Write a modified todo back to the store and broadcast. The record can
    /// vanish between the read and the write; a no-match update is rejected
    /// like any other unknown id, with no broadcast.
    async fn write_todo_back(&self, todo: TodoRecord) -> CoordResult<TodoRecord> {
        if !self
            .store
            .update(Collection::Todos, to_doc(&todo)?)
            .await?
        {
            return Err(CoordinatorError::Validation(format!(
                "no todo with id '{}'",
                todo.id
            )));
        }
        self.broadcast_all(Collection::Todos).await?;
        Ok(todo)
    }

    pub async fn delete_todo(&self, id: &str) -> CoordResult<()> {
        if !self.store.delete(Collection::Todos, id).await? {
            return Err(CoordinatorError::Validation(format!(
                "no todo with id '{}'",
                id
            )));
        }
        self.broadcast_all(Collection::Todos).await?;
        Ok(())
    }

    pub async fn send_message(&self, msg: NewChatMessage) -> CoordResult<ChatRecord> {
        let text = non_empty(&msg.text, "chat text")?;
        let record = ChatRecord {
            id: new_record_id(),
            text,
            time: msg
                .time
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
            username: msg.username,
            avatar: msg.avatar,
        };

        self.store
            .insert(Collection::Chat, to_doc(&record)?)
            .await?;
        self.broadcast_all(Collection::Chat).await?;
        Ok(record)
    }

    async fn require_todo(&self, id: &str) -> CoordResult<TodoRecord> {
        match self.store.get(Collection::Todos, id).await? {
            Some(doc) => from_doc(doc),
            None => Err(CoordinatorError::Validation(format!(
                "no todo with id '{}'",
                id
            ))),
        }
    }

    async fn read_collection<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> CoordResult<Vec<T>> {
        self.store
            .scan(collection)
            .await?
            .into_iter()
            .map(from_doc)
            .collect()
    }
}

fn empty_snapshot(collection: Collection) -> ServerMessage {
    match collection {
        Collection::Todos => ServerMessage::TodosUpdate { todos: Vec::new() },
        Collection::Chat => ServerMessage::ChatUpdate {
            messages: Vec::new(),
        },
    }
}

fn non_empty(text: &str, what: &str) -> CoordResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoordinatorError::Validation(format!(
            "{} must not be empty",
            what
        )));
    }
    Ok(trimmed.to_string())
}

fn to_doc<T: Serialize>(record: &T) -> CoordResult<Document> {
    serde_json::to_value(record)
        .map_err(|e| CoordinatorError::Store(StoreError::Corrupt(e.to_string())))
}

fn from_doc<T: DeserializeOwned>(doc: Document) -> CoordResult<T> {
    serde_json::from_value(doc)
        .map_err(|e| CoordinatorError::Store(StoreError::Corrupt(e.to_string())))
}
