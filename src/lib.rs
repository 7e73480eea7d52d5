// Public API for integration tests and potential library usage

pub mod admission;
pub mod api;
pub mod config;
pub mod coordinator;
pub mod protocol;
pub mod store;
pub mod types;
pub mod ws;
