use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on
    pub port: u16,
    /// Directory for the JSON document store
    pub store_dir: PathBuf,
}

impl ServerConfig {
    /// Load config from environment variables (PORT, STORE_DIR).
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let store_dir = std::env::var("STORE_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        Self { port, store_dir }
    }
}
