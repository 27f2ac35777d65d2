//! OpenAI-compatible client implementation.
//!
//! Talks to any endpoint implementing the chat completions specification,
//! including a local Ollama server. Each request is sent exactly once; a
//! failed call surfaces as an error for the orchestrator to translate into
//! user-facing text.
//!
//! # Security
//!
//! When an API key is configured it is stored with the `secrecy` crate,
//! which prevents accidental logging and zeroes memory on drop. Local
//! backends that need no key simply omit it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use fedbrief_common::chat::Message;
use fedbrief_common::client::{ChatRequest, ChatResponse, Config};
use fedbrief_common::tools::{FunctionCall, ToolCall};

use crate::error::{ClientError, ErrorResponse};
use crate::openai::{ChatCompletionRequest, ChatCompletionResponse, OpenAIMessage};
use crate::LLMClient;

/// Client for OpenAI-compatible chat completion APIs.
#[derive(Clone)]
pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: Option<Arc<SecretString>>,
    base_url: String,
    config: Arc<Config>,
}

// Custom Debug implementation to avoid exposing the API key
impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OpenAIClient {
    /// Create a new client from a configuration.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fedbrief_client::OpenAIClient;
    /// use fedbrief_common::Config;
    ///
    /// let config = Config::new("llama3.1:8b")
    ///     .with_base_url("http://localhost:11434/v1");
    ///
    /// let client = OpenAIClient::new(config)?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or HTTP client
    /// creation fails.
    pub fn new(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ClientError::ConfigurationError(e.to_string()))?;

        url::Url::parse(&config.base_url).map_err(|e| {
            ClientError::ConfigurationError(format!(
                "Invalid base URL '{}': {e}",
                config.base_url
            ))
        })?;

        // None means no timeout (useful for slow local inference)
        let client = match config.timeout_seconds {
            Some(timeout) => reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout))
                .build()?,
            None => reqwest::Client::builder().build()?,
        };

        let api_key = config.api_key.clone().map(Arc::new);
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            api_key,
            base_url,
            config: Arc::new(config),
        })
    }

    async fn make_request<T: for<'de> Deserialize<'de>, B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut request_builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some(api_key) = &self.api_key {
            request_builder = request_builder.header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            );
        }

        let response = request_builder
            .body(serde_json::to_string(body).map_err(ClientError::SerializationError)?)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::TimeoutError
                } else {
                    ClientError::NetworkError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.map_err(|e| {
                warn!("Failed to read error response body: {e}");
                ClientError::NetworkError(e)
            })?;

            // Extract the error message from structured response or use raw text
            let error_message = match serde_json::from_str::<ErrorResponse>(&error_text) {
                Ok(parsed) => parsed.error.message,
                Err(parse_err) => {
                    debug!(
                        "Failed to parse error response as JSON: {parse_err}. Using raw text instead."
                    );
                    error_text
                }
            };

            error!(
                "API request failed with status {}: {}",
                status.as_u16(),
                error_message
            );

            return Err(match status.as_u16() {
                401 => ClientError::AuthenticationError(error_message),
                429 => ClientError::RateLimitError,
                _ => ClientError::RequestError(error_message),
            });
        }

        let response_text = response.text().await?;
        debug!("Raw API response: {response_text}");
        let parsed: T =
            serde_json::from_str(&response_text).map_err(ClientError::SerializationError)?;

        Ok(parsed)
    }

    /// Convert a wire message to our internal message format.
    ///
    /// Tool-call arguments are passed through in whichever shape the backend
    /// produced them; the orchestrator resolves the shape when it executes
    /// the tool.
    fn convert_openai_message(openai_msg: &OpenAIMessage) -> Message {
        let tool_calls = openai_msg
            .tool_calls
            .as_ref()
            .map(|tcs| {
                let mut result = SmallVec::with_capacity(tcs.len());
                for tc in tcs {
                    result.push(ToolCall {
                        id: tc.id.clone(),
                        call_type: tc.r#type.clone(),
                        function: FunctionCall {
                            name: tc.function.name.clone(),
                            arguments: tc.function.arguments.clone(),
                        },
                    });
                }
                result
            })
            .unwrap_or_default();

        Message {
            id: uuid::Uuid::new_v4(),
            role: openai_msg.role,
            content: openai_msg.content.clone().unwrap_or_default(),
            timestamp: Utc::now(),
            tool_calls,
            tool_call_id: openai_msg.tool_call_id.clone(),
            name: openai_msg.name.clone(),
        }
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    fn config(&self) -> &Config {
        &self.config
    }

    fn supports_tools(&self) -> bool {
        true
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.validate_request(request)?;

        let openai_request = ChatCompletionRequest::from((request, self.config.as_ref()));

        let response: ChatCompletionResponse = self
            .make_request("chat/completions", &openai_request)
            .await?;

        let choice = response.choices.first().ok_or_else(|| {
            warn!(
                "Received empty choices array from API. Response ID: {}, Model: {}",
                response.id, response.model
            );
            ClientError::InvalidResponse("API returned no choices in response".to_string())
        })?;

        let message = Self::convert_openai_message(&choice.message);

        Ok(ChatResponse {
            message,
            model: response.model,
            created_at: DateTime::from_timestamp(i64::try_from(response.created).unwrap_or(0), 0)
                .unwrap_or_else(Utc::now),
            response_id: Some(response.id),
        })
    }
}
