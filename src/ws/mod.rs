pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use std::time::Duration;

use crate::coordinator::Coordinator;
use crate::protocol::{ClientMessage, ServerMessage};

/// Ping cadence; bounds how long a dead channel can linger in the fan-out.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(coordinator): State<Arc<Coordinator>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, coordinator))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, coordinator: Arc<Coordinator>) {
    let (mut sender, mut receiver) = socket.split();

    // Register with the fan-out before the initial send so nothing published
    // in between is missed. Reconnects land here again and are
    // indistinguishable from fresh connections.
    let mut updates = coordinator.subscribe();

    tracing::info!(
        "WebSocket connected ({} channels)",
        coordinator.connected_channels()
    );

    // Current snapshot of every collection goes to this channel only
    for snapshot in coordinator.initial_snapshots().await {
        if send_json(&mut sender, &snapshot).await.is_err() {
            tracing::warn!("Failed to deliver initial snapshot");
            return;
        }
    }

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // first tick fires immediately

    loop {
        tokio::select! {
            // Snapshot broadcasts from the coordinator
            update = updates.recv() => {
                match update {
                    Ok(msg) => {
                        if send_json(&mut sender, &msg).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        // Lagging is harmless: the next snapshot supersedes
                        // everything this channel missed
                        tracing::warn!("Broadcast receive error: {}", e);
                    }
                }
            }

            // Heartbeat so dead channels are detected within one interval
            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }

            // Client intents
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                if let Some(response) =
                                    handlers::handle_message(client_msg, &coordinator).await
                                {
                                    if send_json(&mut sender, &response).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            Err(e) => {
                                tracing::error!("Failed to parse client message: {}", e);
                                let error = ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                };
                                let _ = send_json(&mut sender, &error).await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // Dropping `updates` deregisters this channel from the fan-out
    tracing::info!("WebSocket connection closed");
}

async fn send_json(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await,
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            Ok(())
        }
    }
}
