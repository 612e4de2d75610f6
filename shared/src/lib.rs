//! AWS-backed collaborators and runtime configuration for the FixIt client.

pub mod auth;
pub mod config;
pub mod records;
pub mod state;
pub mod storage;

pub use config::AppConfig;
pub use state::AppState;
