//! Response classification.
//!
//! One backend response per turn, three possible readings, in strict
//! priority order:
//!
//! 1. structured tool calls carried on the message (always wins, even when
//!    text content is also present);
//! 2. an argument-only tool call embedded in the text content, reconstructed
//!    only under the exact conditions [`parse_embedded_tool_call`] checks;
//! 3. direct text.
//!
//! Small models sometimes emit the second form: a JSON object in the
//! content, wrapped in `<toolcall>` tags, naming no function. It is only
//! safe to reinterpret when exactly one tool was offered.

use log::{info, warn};
use serde_json::Value;
use smallvec::SmallVec;

use fedbrief_common::chat::{Message, MessageRole};
use fedbrief_common::tools::{Tool, ToolArguments, ToolCall};

const TOOLCALL_OPEN: &str = "<toolcall>";
const TOOLCALL_CLOSE: &str = "</toolcall>";

/// Placeholder reply when the assistant message carries nothing at all.
pub const EMPTY_RESPONSE_TEXT: &str = "AI empty response.";
/// Placeholder reply when the response is not an assistant message.
pub const UNEXPECTED_RESPONSE_TEXT: &str = "AI unexpected response.";

/// What the orchestrator should do with a backend response.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnAction {
    /// Execute a tool (only the first call is honored).
    ToolCalls(SmallVec<[ToolCall; 2]>),
    /// Reply with this text directly.
    Direct(String),
}

/// Classifies a backend response into a [`TurnAction`].
#[must_use]
pub fn classify_response(message: &Message, offered_tools: &[Tool]) -> TurnAction {
    if message.role != MessageRole::Assistant {
        warn!("Backend response was not an assistant message: {:?}", message.role);
        return TurnAction::Direct(UNEXPECTED_RESPONSE_TEXT.to_string());
    }

    if message.has_tool_calls() {
        info!("Structured tool_calls detected.");
        return TurnAction::ToolCalls(message.tool_calls.clone());
    }

    let content = message.content.trim();
    if content.is_empty() {
        warn!("Backend assistant message empty.");
        return TurnAction::Direct(EMPTY_RESPONSE_TEXT.to_string());
    }

    let stripped = strip_toolcall_tags(content);
    if let Some(call) = parse_embedded_tool_call(stripped, offered_tools) {
        return TurnAction::ToolCalls(SmallVec::from_vec(vec![call]));
    }

    TurnAction::Direct(stripped.to_string())
}

/// Removes one matched pair of `<toolcall>` tags wrapping the content.
fn strip_toolcall_tags(content: &str) -> &str {
    if content.starts_with(TOOLCALL_OPEN) && content.ends_with(TOOLCALL_CLOSE) {
        info!("Stripped <toolcall> tags.");
        content[TOOLCALL_OPEN.len()..content.len() - TOOLCALL_CLOSE.len()].trim()
    } else {
        content
    }
}

/// Attempts to reconstruct a tool call from text content.
///
/// Succeeds only when the content is a JSON object with `"type":
/// "function"` and an `arguments` field, names no function of its own, and
/// exactly one tool was offered this turn. The reconstructed call is
/// attributed to that sole tool with a synthetic id recording the
/// assumption. Any other content — including the same payload with a
/// `function` key, or any payload when two tools were offered — is left
/// for the direct-text path.
#[must_use]
pub fn parse_embedded_tool_call(content: &str, offered_tools: &[Tool]) -> Option<ToolCall> {
    let parsed: Value = serde_json::from_str(content).ok()?;
    let obj = parsed.as_object()?;

    if obj.get("type").and_then(Value::as_str) != Some("function") {
        return None;
    }
    if obj.get("function").is_some_and(|f| !f.is_null()) {
        return None;
    }
    let arguments = obj.get("arguments")?;
    if offered_tools.len() != 1 {
        return None;
    }

    let assumed_name = offered_tools[0].function.name.clone();
    info!("Args-only tool call. Assuming: '{assumed_name}'. Args: {arguments}");
    Some(ToolCall::assumed(
        assumed_name,
        ToolArguments::from(arguments.clone()),
    ))
}
