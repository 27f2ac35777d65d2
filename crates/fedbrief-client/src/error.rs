//! Error types for the client library.

use serde::Deserialize;
use thiserror::Error;

/// Error response from the API.
///
/// Wraps the detailed error information returned by chat backends.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// The error detail object from the API.
    pub error: ErrorDetail,
}

/// Detailed error information from the API.
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    /// The error message text describing what went wrong.
    pub message: String,
}

/// Errors that can occur when talking to the chat backend.
///
/// Each turn makes exactly one backend request; none of these conditions
/// triggers a retry. The orchestrator converts any of them into a polite
/// user-facing reply.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Network or HTTP request failure.
    ///
    /// DNS resolution, connection failures, or socket errors.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON serialization or deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// API authentication failure (HTTP 401).
    ///
    /// The API key is missing, invalid, or revoked.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limit exceeded")]
    RateLimitError,

    /// Non-success HTTP status outside the specifically handled codes.
    #[error("Request error: {0}")]
    RequestError(String),

    /// Client configuration issue.
    ///
    /// Invalid base URL or incompatible settings.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The request took longer than the configured timeout.
    #[error("Timeout error")]
    TimeoutError,

    /// Malformed request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unexpected or malformed API response.
    ///
    /// The API returned data that doesn't match the expected format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Tools requested but not supported by this client.
    #[error("Tool execution not supported")]
    ToolsNotSupported,
}

impl ClientError {
    /// Check if this is an authentication error.
    #[must_use]
    pub const fn is_authentication_error(&self) -> bool {
        matches!(self, Self::AuthenticationError(_))
    }
}
