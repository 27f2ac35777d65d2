//! Message types for the chat loop.
//!
//! A [`Message`] is one entry in the transcript sent to the model backend.
//! Roles follow the OpenAI chat-completions convention (system, user,
//! assistant, tool); assistant messages may additionally carry tool calls.
//!
//! # Examples
//!
//! ```
//! use fedbrief_common::chat::{Message, MessageRole};
//!
//! let msg = Message::user("Any executive orders about healthcare this week?");
//! assert_eq!(msg.role, MessageRole::User);
//! assert!(msg.tool_calls.is_empty());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::tools::ToolCall;

/// Who authored a message.
///
/// Serialized to lowercase strings matching the chat-completions wire format.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageRole {
    /// Per-turn instructions for the model. Synthesized fresh each turn and
    /// never stored in history.
    #[serde(rename = "system")]
    System,
    /// Input from the end user.
    #[serde(rename = "user")]
    User,
    /// A reply from the model, possibly carrying tool calls.
    #[serde(rename = "assistant")]
    Assistant,
    /// The result of a tool execution, echoed back to the model.
    #[serde(rename = "tool")]
    Tool,
}

/// A single message in the conversation.
///
/// Messages are immutable once appended to history. Use the role-specific
/// constructors ([`Message::system`], [`Message::user`],
/// [`Message::assistant`], [`Message::tool`]) for the common cases, or the
/// builder for full control:
///
/// ```
/// use fedbrief_common::chat::{Message, MessageRole};
///
/// let msg = Message::builder()
///     .role(MessageRole::Assistant)
///     .content("Checking the register now.".to_string())
///     .build();
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, TypedBuilder)]
pub struct Message {
    /// Unique identifier for this message.
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    /// The role of the message sender.
    pub role: MessageRole,

    /// The text content. Can be empty for assistant messages that only
    /// carry tool calls.
    pub content: String,

    /// When this message was created.
    #[builder(default = Utc::now())]
    pub timestamp: DateTime<Utc>,

    /// Tool calls requested by an assistant message. `SmallVec` keeps the
    /// common zero-or-one-call case off the heap.
    #[builder(default)]
    pub tool_calls: SmallVec<[ToolCall; 2]>,

    /// For tool-role messages, the id of the call this result answers.
    #[builder(default)]
    pub tool_call_id: Option<String>,

    /// For tool-role messages, the name of the function that was called.
    #[builder(default)]
    pub name: Option<String>,
}

impl Message {
    /// Creates a new message with the given role and content.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            tool_calls: SmallVec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Creates a tool result message.
    ///
    /// # Errors
    ///
    /// Returns an error if `tool_call_id` or `function_name` is empty.
    pub fn tool(
        content: impl Into<String>,
        tool_call_id: String,
        function_name: String,
    ) -> anyhow::Result<Self> {
        if tool_call_id.is_empty() {
            anyhow::bail!("Tool call ID cannot be empty");
        }
        if function_name.is_empty() {
            anyhow::bail!("Function name cannot be empty for tool messages");
        }
        let mut msg = Self::new(MessageRole::Tool, content);
        msg.tool_call_id = Some(tool_call_id);
        msg.name = Some(function_name);
        Ok(msg)
    }

    /// Sets the tool calls for this message.
    ///
    /// # Errors
    ///
    /// Returns an error if this is not an assistant message; only the
    /// assistant may request tool execution.
    pub fn with_tool_calls(
        mut self,
        tool_calls: impl Into<SmallVec<[ToolCall; 2]>>,
    ) -> anyhow::Result<Self> {
        if self.role != MessageRole::Assistant {
            anyhow::bail!(
                "Tool calls can only be added to assistant messages, found {:?}",
                self.role
            );
        }
        self.tool_calls = tool_calls.into();
        Ok(self)
    }

    /// Whether this message carries at least one structured tool call.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
