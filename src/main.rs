use axum::{middleware, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use syncpad::{
    admission, api, config::ServerConfig, coordinator::Coordinator, store::JsonFileStore, ws,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "syncpad=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting syncpad...");

    let config = ServerConfig::from_env();
    let origin_policy = Arc::new(admission::OriginPolicy::from_env());

    // Open the backing document store
    let store = match JsonFileStore::open(&config.store_dir).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(
                "Failed to open document store at {}: {}",
                config.store_dir.display(),
                e
            );
            std::process::exit(1);
        }
    };

    let coordinator = Arc::new(Coordinator::new(store));

    // WebSocket route with origin admission
    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(
            origin_policy.clone(),
            admission::origin_admission_middleware,
        ));

    // REST fallback routes
    let api_routes = Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health))
        .route("/api/todos", get(api::get_todos))
        .route("/api/chats", get(api::get_chats));

    let app = Router::new()
        .merge(ws_routes)
        .merge(api_routes)
        .layer(admission::cors_layer(&origin_policy))
        .layer(TraceLayer::new_for_http())
        .with_state(coordinator);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
