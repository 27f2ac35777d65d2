//! Error types for the fedbrief server.

use thiserror::Error;

/// Errors that can occur in the server binary.
#[derive(Debug, Error)]
pub enum ServerError {
    /// I/O error (file operations, socket binding).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document store error.
    #[error("Store error: {0}")]
    Store(#[from] fedbrief_tools::StoreError),

    /// Backend client error.
    #[error("Client error: {0}")]
    Client(String),

    /// Federal Register ingestion error.
    #[error("Ingestion error: {0}")]
    Ingestion(String),
}

/// Result type alias using `ServerError`.
pub type Result<T> = std::result::Result<T, ServerError>;

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Client(err.to_string())
    }
}
