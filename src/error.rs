//! Error types shared across the sync layer.

use thiserror::Error;

/// Errors surfaced by transport, HTTP and configuration code.
///
/// None of these are fatal to a session: the dashboard logs them and falls
/// back to the next scheduled refresh or to polling.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("push channel transport error: {0}")]
    Transport(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid origin `{origin}`: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Result type for sync-layer operations.
pub type Result<T> = std::result::Result<T, SyncError>;
