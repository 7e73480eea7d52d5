use std::sync::Arc;
use syncpad::coordinator::Coordinator;
use syncpad::protocol::{ClientMessage, ServerMessage};
use syncpad::store::{JsonFileStore, MemoryStore};
use syncpad::ws::handlers::handle_message;
use tokio::sync::broadcast::error::TryRecvError;

fn expect_todos(msg: ServerMessage) -> Vec<syncpad::types::TodoRecord> {
    match msg {
        ServerMessage::TodosUpdate { todos } => todos,
        other => panic!("Expected TodosUpdate, got {:?}", other),
    }
}

fn expect_chat(msg: ServerMessage) -> Vec<syncpad::types::ChatRecord> {
    match msg {
        ServerMessage::ChatUpdate { messages } => messages,
        other => panic!("Expected ChatUpdate, got {:?}", other),
    }
}

/// End-to-end flow: two connected channels, todo and chat mutations, with
/// every successful mutation fanned out to both.
#[tokio::test]
async fn test_full_sync_flow() {
    let coordinator = Arc::new(Coordinator::new(Arc::new(MemoryStore::new())));

    // 1. Two clients connect
    let mut client1 = coordinator.subscribe();
    let mut client2 = coordinator.subscribe();

    // A fresh connection gets empty snapshots, not an error or hang
    let initial = coordinator.initial_snapshots().await;
    assert_eq!(initial.len(), 2);
    assert!(expect_todos(initial[0].clone()).is_empty());
    assert!(expect_chat(initial[1].clone()).is_empty());

    // 2. Client 1 adds a todo
    let response = handle_message(
        ClientMessage::AddTodo {
            text: "Buy milk".to_string(),
        },
        &coordinator,
    )
    .await;
    assert!(response.is_none(), "mutations are fire-and-forget");

    let todos1 = expect_todos(client1.recv().await.unwrap());
    let todos2 = expect_todos(client2.recv().await.unwrap());
    assert_eq!(todos1, todos2, "fan-out must reach every channel");
    assert_eq!(todos1.len(), 1);
    assert_eq!(todos1[0].text, "Buy milk");
    assert!(!todos1[0].completed);
    let todo_id = todos1[0].id.clone();

    // 3. Client 2 toggles it; both clients see the flip
    handle_message(
        ClientMessage::ToggleTodo {
            id: todo_id.clone(),
        },
        &coordinator,
    )
    .await;

    let todos1 = expect_todos(client1.recv().await.unwrap());
    let todos2 = expect_todos(client2.recv().await.unwrap());
    assert_eq!(todos1, todos2);
    assert!(todos1[0].completed);

    // 4. Chat messages arrive in send order, newest last
    for text in ["hello", "world"] {
        handle_message(
            ClientMessage::SendMessage {
                text: text.to_string(),
                username: "ana".to_string(),
                avatar: "a.png".to_string(),
                time: None,
            },
            &coordinator,
        )
        .await;
    }

    let _ = client1.recv().await.unwrap();
    let messages = expect_chat(client1.recv().await.unwrap());
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "hello");
    assert_eq!(messages[1].text, "world");

    // Client 2 sees the identical chat log
    let _ = client2.recv().await.unwrap();
    assert_eq!(expect_chat(client2.recv().await.unwrap()), messages);

    // 5. A late joiner sees exactly what connected clients hold
    let late = coordinator.initial_snapshots().await;
    assert_eq!(expect_todos(late[0].clone()), todos1);
    assert_eq!(expect_chat(late[1].clone()), messages);

    // 6. Invalid intents are dropped without any broadcast
    handle_message(
        ClientMessage::DeleteTodo {
            id: "no-such-id".to_string(),
        },
        &coordinator,
    )
    .await;
    handle_message(
        ClientMessage::AddTodo {
            text: "   ".to_string(),
        },
        &coordinator,
    )
    .await;
    assert!(matches!(client2.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(coordinator.todos().await.unwrap().len(), 1);

    // 7. Deleting the todo empties the broadcast snapshot
    handle_message(ClientMessage::DeleteTodo { id: todo_id }, &coordinator).await;
    assert!(expect_todos(client2.recv().await.unwrap()).is_empty());
}

/// Records written through one coordinator are visible to a coordinator
/// opened later over the same store directory.
#[tokio::test]
async fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
        let coordinator = Arc::new(Coordinator::new(store));
        handle_message(
            ClientMessage::AddTodo {
                text: "survive restart".to_string(),
            },
            &coordinator,
        )
        .await;
        handle_message(
            ClientMessage::SendMessage {
                text: "still here".to_string(),
                username: "ana".to_string(),
                avatar: "a.png".to_string(),
                time: Some("10:32".to_string()),
            },
            &coordinator,
        )
        .await;
    }

    let store = Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
    let coordinator = Coordinator::new(store);

    let todos = coordinator.todos().await.unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].text, "survive restart");

    let messages = coordinator.chat_log().await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].time, "10:32");
}

/// A dropped channel must not abort the fan-out to the rest.
#[tokio::test]
async fn test_dead_channel_does_not_break_fanout() {
    let coordinator = Arc::new(Coordinator::new(Arc::new(MemoryStore::new())));

    let gone = coordinator.subscribe();
    let mut alive = coordinator.subscribe();
    drop(gone);

    handle_message(
        ClientMessage::AddTodo {
            text: "for the living".to_string(),
        },
        &coordinator,
    )
    .await;

    let todos = expect_todos(alive.recv().await.unwrap());
    assert_eq!(todos[0].text, "for the living");
    assert_eq!(coordinator.connected_channels(), 1);
}
