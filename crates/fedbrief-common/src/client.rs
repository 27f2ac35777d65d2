//! Backend configuration and the chat request/response pair.
//!
//! [`Config`] holds connection details for an OpenAI-compatible chat
//! backend; [`ChatRequest`] and [`ChatResponse`] are the provider-neutral
//! request and response shapes the orchestrator works with. Requests are
//! sent exactly once per turn; there is no retry policy.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::chat::Message;
use crate::tools::Tool;

/// Configuration for a chat backend.
///
/// # Security
///
/// The `api_key` field uses `SecretString` to prevent accidental logging or
/// display of credentials, and is never serialized.
///
/// # Examples
///
/// ```
/// use fedbrief_common::Config;
///
/// let config = Config::new("llama3.1:8b")
///     .with_base_url("http://localhost:11434/v1")
///     .with_temperature(0.2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The model identifier to request.
    pub model: String,
    /// Base URL of the OpenAI-compatible endpoint.
    pub base_url: String,
    /// API key for authentication, if the endpoint requires one.
    ///
    /// Will not be serialized to prevent accidental exposure.
    #[serde(skip_serializing, default)]
    pub api_key: Option<SecretString>,
    /// Request timeout in seconds. `None` uses the HTTP client's default.
    pub timeout_seconds: Option<u64>,
    /// Default sampling temperature (0.0 to 2.0).
    pub temperature: Option<f32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "llama3.1:8b".to_string(),
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: None,
            timeout_seconds: None,
            temperature: None,
        }
    }
}

impl Config {
    /// Creates a configuration for the given model with default connection
    /// settings.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Sets the base URL of the chat endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the API key for authentication.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into().into()));
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Sets the default sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Validates the configuration parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if `model` or `base_url` is empty, or if
    /// `temperature` is outside 0.0..=2.0.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.model.is_empty() {
            anyhow::bail!("Model cannot be empty");
        }
        if self.base_url.is_empty() {
            anyhow::bail!("Base URL cannot be empty");
        }
        if let Some(temp) = self.temperature
            && !(0.0..=2.0).contains(&temp)
        {
            anyhow::bail!("Temperature must be between 0.0 and 2.0, got {temp}");
        }
        Ok(())
    }
}

/// A request for a chat completion.
///
/// Carries the full transcript for this turn plus the tools offered to the
/// model. The tool list is transmitted verbatim on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The conversation messages to send to the model.
    pub messages: Arc<[Message]>,
    /// The model identifier to use for generation.
    pub model: Option<String>,
    /// Sampling temperature controlling randomness (0.0 to 2.0).
    pub temperature: Option<f32>,
    /// Tools available for the model to call.
    pub tools: Option<Vec<Tool>>,
    /// Whether to stream the response incrementally. Always `false` here;
    /// replies are delivered whole.
    pub stream: bool,
}

impl ChatRequest {
    /// Creates a new chat request with the given messages.
    pub fn new(messages: impl Into<Arc<[Message]>>) -> Self {
        Self {
            messages: messages.into(),
            model: None,
            temperature: None,
            tools: None,
            stream: false,
        }
    }

    /// Sets the model to use for this request.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the tools available for the model to call.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Validates that this request is well formed.
    ///
    /// # Errors
    ///
    /// Returns an error if the messages are empty or the temperature is out
    /// of range.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.messages.is_empty() {
            anyhow::bail!("Chat request must have at least one message");
        }
        if let Some(temp) = self.temperature
            && !(0.0..=2.0).contains(&temp)
        {
            anyhow::bail!("Temperature must be between 0.0 and 2.0, got {temp}");
        }
        Ok(())
    }

    /// Returns whether this request has tools configured.
    #[must_use]
    pub fn has_tools(&self) -> bool {
        self.tools.as_ref().is_some_and(|t| !t.is_empty())
    }
}

impl From<(&Config, Vec<Message>)> for ChatRequest {
    fn from((config, messages): (&Config, Vec<Message>)) -> Self {
        Self {
            messages: messages.into(),
            model: Some(config.model.clone()),
            temperature: config.temperature,
            tools: None,
            stream: false,
        }
    }
}

impl fmt::Display for ChatRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(_) => write!(f, "Error serializing ChatRequest to JSON"),
        }
    }
}

/// A response from a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated message from the model.
    pub message: Message,
    /// The identifier of the model that generated this response.
    pub model: String,
    /// Timestamp when this response was created.
    pub created_at: DateTime<Utc>,
    /// Unique identifier for this response from the provider.
    pub response_id: Option<String>,
}

impl fmt::Display for ChatResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(_) => write!(f, "Error serializing ChatResponse to JSON"),
        }
    }
}
