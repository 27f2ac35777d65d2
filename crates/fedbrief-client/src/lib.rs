//! # fedbrief-client
//!
//! Client library for talking to an OpenAI-compatible chat backend.
//!
//! The [`LLMClient`] trait is the seam the orchestrator programs against;
//! [`OpenAIClient`] is the production implementation, pointed by default at
//! a local Ollama endpoint. Requests are sent exactly once with no retry
//! layer; failures surface as [`ClientError`] values for the caller to
//! translate.
//!
//! ## Example
//!
//! ```no_run
//! use fedbrief_client::{LLMClient, OpenAIClient};
//! use fedbrief_common::{ChatRequest, Config, Message};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::new("llama3.1:8b")
//!     .with_base_url("http://localhost:11434/v1");
//!
//! let client = OpenAIClient::new(config)?;
//!
//! let message = Message::user("Any new executive orders this week?");
//! let request = ChatRequest::from((client.config(), vec![message]));
//!
//! let response = client.chat(&request).await?;
//! println!("Response: {}", response.message.content);
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use async_trait::async_trait;

use fedbrief_common::{ChatRequest, ChatResponse, Config};

pub mod error;
pub mod openai;

pub use error::ClientError;
pub use openai::OpenAIClient;

/// Trait for chat backend implementations.
///
/// Provides a unified interface the orchestrator can drive without knowing
/// which backend is behind it. Implementations must be thread-safe
/// (Send + Sync).
#[must_use = "LLMClient must be used to make requests"]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Get the client's configuration.
    fn config(&self) -> &Config;

    /// Send a chat completion request to the backend.
    ///
    /// Sent exactly once; there is no retry on failure.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request fails validation
    /// - Network communication fails or times out
    /// - The API returns an error (authentication, rate limit, etc.)
    /// - The response cannot be parsed
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Check if the client supports tool/function calling.
    fn supports_tools(&self) -> bool;

    /// Validate a chat request before sending.
    ///
    /// # Errors
    ///
    /// Returns an error if the request has no messages, or carries tools
    /// when the client does not support them.
    fn validate_request(&self, request: &ChatRequest) -> Result<()> {
        request
            .validate()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        if !self.supports_tools() && request.has_tools() {
            return Err(ClientError::ToolsNotSupported.into());
        }

        Ok(())
    }
}
