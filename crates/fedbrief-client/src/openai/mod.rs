//! OpenAI chat-completions API types and client implementation.
//!
//! Wire types for the chat completions endpoint, usable against any
//! OpenAI-compatible backend (Ollama included).

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use typed_builder::TypedBuilder;

use fedbrief_common::chat::{Message, MessageRole};
use fedbrief_common::client::{ChatRequest, Config};
use fedbrief_common::tools::{FunctionCall, Tool, ToolArguments, ToolCall};

pub mod client;
pub use client::OpenAIClient;

/// A single choice from a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The index of this choice in the response array.
    pub index: u32,
    /// The generated message for this choice.
    pub message: OpenAIMessage,
    /// Why generation stopped for this choice.
    ///
    /// Common values: "stop", "length", "tool_calls"
    pub finish_reason: Option<String>,
}

/// OpenAI-compatible message format.
///
/// Wrapper type for serializing/deserializing messages to the wire format.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct OpenAIMessage {
    /// The role of the message author.
    pub role: MessageRole,
    /// The text content of the message (optional for tool calls).
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Optional name of the message author.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool calls requested by the assistant (optional).
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<SmallVec<[OpenAIToolCall; 2]>>,
    /// ID of the tool call this message is responding to (for tool messages).
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl From<&Message> for OpenAIMessage {
    fn from(message: &Message) -> Self {
        let tool_calls = if message.tool_calls.is_empty() {
            None
        } else {
            Some(
                message
                    .tool_calls
                    .iter()
                    .map(OpenAIToolCall::from)
                    .collect(),
            )
        };

        // Only include content if it's non-empty
        let content = if message.content.is_empty() {
            None
        } else {
            Some(message.content.clone())
        };

        OpenAIMessage::builder()
            .role(message.role)
            .content(content)
            .name(message.name.clone())
            .tool_calls(tool_calls)
            .tool_call_id(message.tool_call_id.clone())
            .build()
    }
}

/// OpenAI-compatible tool call format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIToolCall {
    /// Unique identifier for this tool call.
    pub id: String,
    /// Type of the tool call, typically "function".
    #[serde(rename = "type", default = "default_tool_call_type")]
    pub r#type: String,
    /// The function to call with its arguments.
    pub function: OpenAIFunction,
}

fn default_tool_call_type() -> String {
    "function".to_string()
}

impl From<&ToolCall> for OpenAIToolCall {
    fn from(tool_call: &ToolCall) -> Self {
        Self {
            id: tool_call.id.clone(),
            r#type: tool_call.call_type.clone(),
            function: OpenAIFunction {
                name: tool_call.function.name.clone(),
                arguments: tool_call.function.arguments.clone(),
            },
        }
    }
}

/// OpenAI-compatible function call format.
///
/// Arguments usually arrive as a JSON-encoded string, but some backends
/// emit a structured object instead. Both shapes deserialize into
/// [`ToolArguments`] unchanged; normalization happens later, at the
/// orchestrator boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIFunction {
    /// The name of the function to call.
    pub name: String,
    /// The arguments, in whichever shape the backend produced.
    #[serde(default)]
    pub arguments: ToolArguments,
}

/// Request body for the chat completions endpoint.
#[derive(Debug, Clone, Serialize, TypedBuilder)]
pub struct ChatCompletionRequest {
    /// The model identifier to use.
    pub model: String,
    /// The conversation messages in wire format.
    pub messages: Vec<OpenAIMessage>,
    /// Sampling temperature 0.0 to 2.0 (optional).
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Whether to stream the response (always false here).
    #[builder(default = Some(false))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Tools available for function calling (optional).
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

impl From<(&ChatRequest, &Config)> for ChatCompletionRequest {
    fn from((request, config): (&ChatRequest, &Config)) -> Self {
        let messages: Vec<OpenAIMessage> =
            request.messages.iter().map(OpenAIMessage::from).collect();

        ChatCompletionRequest::builder()
            .model(
                request
                    .model
                    .clone()
                    .unwrap_or_else(|| config.model.clone()),
            )
            .messages(messages)
            .temperature(request.temperature.or(config.temperature))
            .stream(Some(false))
            .tools(request.tools.clone())
            .build()
    }
}

/// Response body from the chat completions endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    /// Unique identifier for this completion.
    pub id: String,
    /// Unix timestamp of when the completion was created.
    pub created: u64,
    /// The model that generated this completion.
    pub model: String,
    /// Array of generated completions.
    pub choices: Vec<ChatChoice>,
}
