//! REST fallback endpoints.
//!
//! Serve the same snapshot shapes as the realtime push, for clients that
//! poll instead of subscribing.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::coordinator::Coordinator;

/// GET /api/todos - current todo list, newest first
pub async fn get_todos(State(coordinator): State<Arc<Coordinator>>) -> Response {
    match coordinator.todos().await {
        Ok(todos) => Json(todos).into_response(),
        Err(e) => {
            tracing::error!("Failed to read todos: {}", e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

/// GET /api/chats - full chat log, oldest first
pub async fn get_chats(State(coordinator): State<Arc<Coordinator>>) -> Response {
    match coordinator.chat_log().await {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => {
            tracing::error!("Failed to read chat log: {}", e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

/// GET /health - process liveness for deployment platforms
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

/// GET / - banner to verify the server is up
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "syncpad server is running",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::TodoRecord;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    fn test_app() -> (Arc<Coordinator>, Router) {
        let coordinator = Arc::new(Coordinator::new(Arc::new(MemoryStore::new())));
        let app = Router::new()
            .route("/", get(root))
            .route("/health", get(health))
            .route("/api/todos", get(get_todos))
            .route("/api/chats", get(get_chats))
            .with_state(coordinator.clone());
        (coordinator, app)
    }

    #[tokio::test]
    async fn test_todos_endpoint_matches_realtime_snapshot() {
        let (coordinator, app) = test_app();
        coordinator.add_todo("first").await.unwrap();
        coordinator.add_todo("second").await.unwrap();

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/todos")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let todos: Vec<TodoRecord> = serde_json::from_slice(&body).unwrap();
        assert_eq!(todos, coordinator.todos().await.unwrap());
        assert_eq!(todos[0].text, "second");
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (_coordinator, app) = test_app();

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
