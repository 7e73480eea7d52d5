//! WebSocket intent dispatch
//!
//! Maps parsed client messages onto coordinator mutations. Mutation results
//! are deliberately not answered: success reaches the client as the next
//! broadcast snapshot, and a dropped intent reaches it as the absence of one.

use crate::coordinator::{CoordResult, Coordinator, NewChatMessage};
use crate::protocol::{ClientMessage, ServerMessage};
use std::sync::Arc;

/// Handle a client message and return an optional direct response.
pub async fn handle_message(
    msg: ClientMessage,
    coordinator: &Arc<Coordinator>,
) -> Option<ServerMessage> {
    let result: CoordResult<()> = match msg {
        ClientMessage::AddTodo { text } => coordinator.add_todo(&text).await.map(drop),

        ClientMessage::ToggleTodo { id } => coordinator.toggle_todo(&id).await.map(drop),

        ClientMessage::DeleteTodo { id } => coordinator.delete_todo(&id).await,

        ClientMessage::UpdateTodo { id, text } => {
            coordinator.update_todo(&id, &text).await.map(drop)
        }

        ClientMessage::SendMessage {
            text,
            username,
            avatar,
            time,
        } => coordinator
            .send_message(NewChatMessage {
                text,
                username,
                avatar,
                time,
            })
            .await
            .map(drop),
    };

    if let Err(e) = result {
        tracing::warn!("Dropped mutation intent: {}", e);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tokio::sync::broadcast::error::TryRecvError;

    #[tokio::test]
    async fn test_add_todo_intent_reaches_subscribers() {
        let coordinator = Arc::new(Coordinator::new(Arc::new(MemoryStore::new())));
        let mut rx = coordinator.subscribe();

        let response = handle_message(
            ClientMessage::AddTodo {
                text: "Buy milk".to_string(),
            },
            &coordinator,
        )
        .await;
        assert!(response.is_none());

        match rx.recv().await.unwrap() {
            ServerMessage::TodosUpdate { todos } => {
                assert_eq!(todos.len(), 1);
                assert_eq!(todos[0].text, "Buy milk");
            }
            other => panic!("expected todos snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_intent_is_dropped_silently() {
        let coordinator = Arc::new(Coordinator::new(Arc::new(MemoryStore::new())));
        let mut rx = coordinator.subscribe();

        let response = handle_message(
            ClientMessage::DeleteTodo {
                id: "no-such-id".to_string(),
            },
            &coordinator,
        )
        .await;

        // Fire-and-forget: no direct reply, no broadcast
        assert!(response.is_none());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }
}
