use serde::{Deserialize, Serialize};

/// Record identifier. ULID strings sort lexicographically by creation time,
/// so "order by id" is insertion order.
pub type RecordId = String;

/// Mint a fresh record id.
pub fn new_record_id() -> RecordId {
    ulid::Ulid::new().to_string()
}

/// The two managed collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Todos,
    Chat,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Todos, Collection::Chat];

    /// Stable name used as the store collection key.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Todos => "todos",
            Collection::Chat => "chat",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoRecord {
    pub id: RecordId,
    pub text: String,
    pub completed: bool,
}

/// Chat messages are append-only: never mutated or deleted after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRecord {
    pub id: RecordId,
    pub text: String,
    pub time: String,
    pub username: String,
    pub avatar: String,
}
