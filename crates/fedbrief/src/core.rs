//! The per-turn orchestrator.
//!
//! [`Orchestrator::run_turn`] is the whole request/response cycle: build
//! the prompt, call the backend once, classify the reply, execute at most
//! one tool, format the result, and record the turn in history. It always
//! returns reply text — every failure mode inside the turn becomes a
//! polite string, never an error to the caller.

use std::sync::{Mutex, PoisonError};

use log::{debug, error, info, warn};
use serde_json::Value;

use fedbrief_client::LLMClient;
use fedbrief_common::chat::Message;
use fedbrief_common::client::ChatRequest;
use fedbrief_common::history::History;
use fedbrief_common::tools::{Tool, ToolArguments, ToolCall};
use fedbrief_tools::ToolRegistry;

use crate::classify::{TurnAction, classify_response};
use crate::error::TurnError;
use crate::format::{ToolReply, format_tool_output};

/// Per-turn instruction sent to the model. Synthesized fresh on every call
/// and never stored in history.
const SYSTEM_PROMPT: &str = "You are an AI assistant with access to a tool called 'search_federal_executive_orders'.
Your primary function is to determine if the user's request requires searching for federal executive orders.
- If the user asks about executive orders, especially with dates or keywords, you MUST call the 'search_federal_executive_orders' tool.
- When calling the tool:
    - For 'query_keywords': Use specific keywords from the user's query. If none, use an empty string.
    - For 'date_range_str': Extract date information (e.g., \"last_30_days\", \"YYYY-MM-DD\"). Default to \"last_7_days\" if unclear.
- If the request is not about finding executive orders, respond conversationally.
- **Do NOT answer about executive order listings from your own knowledge. If a search is needed, your ONLY action is to call the tool.**
";

/// Drives one chat turn at a time against a backend and a tool registry.
///
/// History is a single process-wide buffer shared by all callers, guarded
/// by a mutex; the append-and-truncate step at the end of a turn happens
/// under one lock acquisition.
pub struct Orchestrator<C: LLMClient> {
    client: C,
    registry: ToolRegistry,
    history: Mutex<History>,
}

impl<C: LLMClient> Orchestrator<C> {
    /// Creates an orchestrator over the given backend client and tools.
    pub fn new(client: C, registry: ToolRegistry) -> Self {
        Self {
            client,
            registry,
            history: Mutex::new(History::new()),
        }
    }

    /// Number of messages currently retained in history.
    pub fn history_len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Runs one full chat turn and returns the reply text.
    ///
    /// Never fails: backend errors, malformed tool calls, unknown tools,
    /// and tool execution failures all resolve to fixed user-facing
    /// strings, and the turn is recorded in history either way.
    pub async fn run_turn(&self, user_message: &str) -> String {
        info!("Processing chat turn. User message: '{user_message}'");

        let tools = self.registry.get_all_definitions();

        let mut messages = vec![Message::system(SYSTEM_PROMPT)];
        messages.extend(
            self.history
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .snapshot(),
        );
        messages.push(Message::user(user_message));

        let mut request = ChatRequest::from((self.client.config(), messages));
        if !tools.is_empty() {
            request = request.with_tools(tools.clone());
        }

        let reply = match self.client.chat(&request).await {
            Ok(response) => {
                debug!("Backend response: {response}");
                self.resolve_response(&response.message, &tools).await
            }
            Err(e) => {
                error!("Backend processing error: {e}");
                TurnError::Backend(e).user_text()
            }
        };

        // Append and truncate under a single lock so concurrent turns never
        // interleave half-recorded pairs.
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_turn(Message::user(user_message), Message::assistant(&reply));

        reply
    }

    async fn resolve_response(&self, message: &Message, tools: &[Tool]) -> String {
        match classify_response(message, tools) {
            TurnAction::Direct(text) => {
                info!("Agent direct text reply.");
                text
            }
            TurnAction::ToolCalls(calls) => match self.execute_first_call(&calls).await {
                Ok(reply) => reply.into_reply_text(),
                Err(e) => {
                    warn!("Tool path failed: {e}");
                    e.user_text()
                }
            },
        }
    }

    /// Executes the first proposed tool call; any additional calls in the
    /// same response are ignored (one tool per turn).
    async fn execute_first_call(&self, calls: &[ToolCall]) -> Result<ToolReply, TurnError> {
        let Some(call) = calls.first() else {
            // Classification never produces an empty call list.
            return Ok(ToolReply::Terminal(String::new()));
        };
        if calls.len() > 1 {
            warn!("{} tool calls proposed; executing only the first.", calls.len());
        }

        let name = call.function.name.clone();
        let args = normalize_arguments(call)?;

        let tool = self
            .registry
            .get(&name)
            .ok_or_else(|| TurnError::UnknownTool { name: name.clone() })?;

        info!("Executing: '{name}', ID: '{}'", call.id);
        let raw = tool
            .execute(&Value::Object(args))
            .await
            .map_err(|source| TurnError::Execution {
                name: name.clone(),
                source,
            })?;

        Ok(format_tool_output(&raw))
    }
}

/// Resolves the argument union to a plain JSON object, exactly once.
///
/// A raw string is parsed as JSON and must yield an object; a structured
/// map passes through; anything else is rejected before the tool runs.
fn normalize_arguments(
    call: &ToolCall,
) -> Result<serde_json::Map<String, Value>, TurnError> {
    let name = &call.function.name;
    match &call.function.arguments {
        ToolArguments::Raw(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => {
                warn!("Tool args for {name} parsed to non-object: {other}");
                Err(TurnError::ArgumentShape { name: name.clone() })
            }
            Err(e) => {
                error!("Tool args parse error for {name}: {e}");
                Err(TurnError::InvalidArguments { name: name.clone() })
            }
        },
        ToolArguments::Structured(map) => Ok(map.clone()),
        ToolArguments::Other(value) => {
            warn!("Tool args for {name} had unexpected shape: {value}");
            Err(TurnError::ArgumentShape { name: name.clone() })
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::collections::VecDeque;
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;

    use fedbrief_common::client::{ChatResponse, Config};
    use fedbrief_common::tools::{Function, Tool};
    use fedbrief_tools::ToolImplementation;

    use super::*;

    /// Backend stub that replays scripted responses in order.
    struct ScriptedClient {
        config: Config,
        responses: Mutex<VecDeque<Result<Message>>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<Message>>) -> Self {
            Self {
                config: Config::new("scripted-model"),
                responses: Mutex::new(responses.into_iter().collect()),
            }
        }

        fn repeating_text(text: &str, turns: usize) -> Self {
            Self::new(
                (0..turns)
                    .map(|_| Ok(Message::assistant(text)))
                    .collect(),
            )
        }
    }

    #[async_trait]
    impl LLMClient for ScriptedClient {
        fn config(&self) -> &Config {
            &self.config
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse> {
            let message = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted")?;
            Ok(ChatResponse {
                message,
                model: "scripted-model".to_string(),
                created_at: Utc::now(),
                response_id: None,
            })
        }

        fn supports_tools(&self) -> bool {
            true
        }
    }

    /// Search-tool stub returning a fixed JSON payload.
    struct CannedSearchTool {
        payload: String,
    }

    #[async_trait]
    impl ToolImplementation for CannedSearchTool {
        fn get_definition(&self) -> Tool {
            Tool::function(Function {
                name: "search_federal_executive_orders".to_string(),
                description: "Searches executive orders".to_string(),
                parameters: json!({"type": "object", "properties": {}}),
            })
        }

        async fn execute(&self, _args: &Value) -> Result<String> {
            Ok(self.payload.clone())
        }
    }

    /// Tool whose execution always fails.
    struct FailingTool;

    #[async_trait]
    impl ToolImplementation for FailingTool {
        fn get_definition(&self) -> Tool {
            Tool::function(Function {
                name: "search_federal_executive_orders".to_string(),
                description: "Searches executive orders".to_string(),
                parameters: json!({"type": "object", "properties": {}}),
            })
        }

        async fn execute(&self, _args: &Value) -> Result<String> {
            anyhow::bail!("store unavailable")
        }
    }

    fn registry_with(tool: impl ToolImplementation + 'static) -> ToolRegistry {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(tool));
        registry
    }

    fn two_documents_json() -> String {
        json!([
            {
                "title": "Trade and Tariffs",
                "document_number": "2025-003",
                "publication_date": "2025-05-20",
                "html_url": "https://www.federalregister.gov/d/2025-003",
                "abstract": "Tariff adjustments."
            },
            {
                "title": "Energy Independence",
                "document_number": "2025-002",
                "publication_date": "2025-05-10",
                "html_url": "https://www.federalregister.gov/d/2025-002",
                "abstract": "Energy policy."
            }
        ])
        .to_string()
    }

    fn search_call(arguments: ToolArguments) -> Message {
        let call = ToolCall::new("search_federal_executive_orders", arguments);
        Message::assistant("")
            .with_tool_calls(vec![call])
            .unwrap()
    }

    #[tokio::test]
    async fn test_direct_text_turn() {
        let client = ScriptedClient::new(vec![Ok(Message::assistant("Hello! How can I help?"))]);
        let orchestrator = Orchestrator::new(client, ToolRegistry::new());

        let reply = orchestrator.run_turn("hi").await;
        assert_eq!(reply, "Hello! How can I help?");
        assert_eq!(orchestrator.history_len(), 2);
    }

    #[tokio::test]
    async fn test_tool_turn_with_findings() {
        let client = ScriptedClient::new(vec![Ok(search_call(ToolArguments::Raw(
            r#"{"query_keywords": "energy tariffs"}"#.to_string(),
        )))]);
        let orchestrator = Orchestrator::new(
            client,
            registry_with(CannedSearchTool {
                payload: two_documents_json(),
            }),
        );

        let reply = orchestrator.run_turn("anything about energy?").await;
        assert!(reply.starts_with(
            "Okay, I found the following executive orders based on your request:\n\n"
        ));
        assert!(reply.contains("Trade and Tariffs"));
        assert!(reply.contains("\n---\n"));
    }

    #[tokio::test]
    async fn test_tool_turn_empty_results() {
        let client = ScriptedClient::new(vec![Ok(search_call(ToolArguments::empty()))]);
        let orchestrator = Orchestrator::new(
            client,
            registry_with(CannedSearchTool {
                payload: "[]".to_string(),
            }),
        );

        let reply = orchestrator.run_turn("anything new?").await;
        assert_eq!(reply, "No executive orders found for the given criteria.");
    }

    #[tokio::test]
    async fn test_embedded_tool_call_executes() {
        let content = r#"{"type":"function","arguments":{"query_keywords":"climate"}}"#;
        let client = ScriptedClient::new(vec![Ok(Message::assistant(content))]);
        let orchestrator = Orchestrator::new(
            client,
            registry_with(CannedSearchTool {
                payload: two_documents_json(),
            }),
        );

        let reply = orchestrator.run_turn("climate orders?").await;
        assert!(reply.contains("Energy Independence"));
    }

    #[tokio::test]
    async fn test_invalid_raw_arguments() {
        let client = ScriptedClient::new(vec![Ok(search_call(ToolArguments::Raw(
            "{broken json".to_string(),
        )))]);
        let orchestrator = Orchestrator::new(
            client,
            registry_with(CannedSearchTool {
                payload: "[]".to_string(),
            }),
        );

        let reply = orchestrator.run_turn("search").await;
        assert_eq!(
            reply,
            "Error: Invalid arguments for tool search_federal_executive_orders."
        );
    }

    #[tokio::test]
    async fn test_non_object_arguments() {
        let client = ScriptedClient::new(vec![Ok(search_call(ToolArguments::Raw(
            "[1, 2, 3]".to_string(),
        )))]);
        let orchestrator = Orchestrator::new(
            client,
            registry_with(CannedSearchTool {
                payload: "[]".to_string(),
            }),
        );

        let reply = orchestrator.run_turn("search").await;
        assert_eq!(
            reply,
            "Error: Tool arguments for search_federal_executive_orders had an unexpected type."
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_name() {
        let call = ToolCall::new("frobnicate", ToolArguments::empty());
        let message = Message::assistant("").with_tool_calls(vec![call]).unwrap();
        let client = ScriptedClient::new(vec![Ok(message)]);
        let orchestrator = Orchestrator::new(
            client,
            registry_with(CannedSearchTool {
                payload: "[]".to_string(),
            }),
        );

        let reply = orchestrator.run_turn("search").await;
        assert_eq!(reply, "Error: Tool 'frobnicate' is not available.");
    }

    #[tokio::test]
    async fn test_tool_execution_failure() {
        let client = ScriptedClient::new(vec![Ok(search_call(ToolArguments::empty()))]);
        let orchestrator = Orchestrator::new(client, registry_with(FailingTool));

        let reply = orchestrator.run_turn("search").await;
        assert_eq!(
            reply,
            "System error during search_federal_executive_orders execution."
        );
        // The failure is contained; the turn still lands in history.
        assert_eq!(orchestrator.history_len(), 2);
    }

    #[tokio::test]
    async fn test_backend_failure_is_fail_soft() {
        let client = ScriptedClient::new(vec![Err(anyhow::anyhow!("connection refused"))]);
        let orchestrator = Orchestrator::new(client, ToolRegistry::new());

        let reply = orchestrator.run_turn("hello").await;
        assert_eq!(
            reply,
            "Sorry, an unexpected error occurred while processing your request."
        );
        assert_eq!(orchestrator.history_len(), 2);
    }

    #[tokio::test]
    async fn test_history_truncates_after_eleven_turns() {
        let client = ScriptedClient::repeating_text("noted", 11);
        let orchestrator = Orchestrator::new(client, ToolRegistry::new());

        for turn in 0..11 {
            orchestrator.run_turn(&format!("message {turn}")).await;
        }
        assert_eq!(orchestrator.history_len(), 20);
    }

    #[tokio::test]
    async fn test_structured_call_beats_accompanying_text() {
        let call = ToolCall::new("search_federal_executive_orders", ToolArguments::empty());
        let message = Message::assistant("Let me check that for you.")
            .with_tool_calls(vec![call])
            .unwrap();
        let client = ScriptedClient::new(vec![Ok(message)]);
        let orchestrator = Orchestrator::new(
            client,
            registry_with(CannedSearchTool {
                payload: "[]".to_string(),
            }),
        );

        let reply = orchestrator.run_turn("search").await;
        // The tool ran; the accompanying text was discarded.
        assert_eq!(reply, "No executive orders found for the given criteria.");
    }
}
