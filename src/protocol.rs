use crate::types::{ChatRecord, RecordId, TodoRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    AddTodo {
        text: String,
    },
    ToggleTodo {
        id: RecordId,
    },
    DeleteTodo {
        id: RecordId,
    },
    UpdateTodo {
        id: RecordId,
        text: String,
    },
    SendMessage {
        text: String,
        username: String,
        avatar: String,
        /// Client-supplied timestamp; filled server-side when absent
        #[serde(default)]
        time: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full todo list, newest first
    TodosUpdate { todos: Vec<TodoRecord> },
    /// Full chat log, oldest first
    ChatUpdate { messages: Vec<ChatRecord> },
    Error { code: String, msg: String },
}
