//! HTTP surface.
//!
//! Two routes: `GET /` serves the embedded chat page, `POST /chat` accepts
//! a form-encoded user message and returns the reply as JSON. The chat
//! route always answers 200; the orchestrator turns every internal failure
//! into reply text.

use std::sync::Arc;

use axum::extract::{Form, State};
use axum::response::{Html, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;

use fedbrief::Orchestrator;
use fedbrief_client::LLMClient;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Shared state behind the router.
pub struct AppState<C: LLMClient> {
    /// The turn orchestrator; owns the conversation history.
    pub orchestrator: Orchestrator<C>,
}

/// Form body of `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatForm {
    /// The user's message, verbatim.
    pub user_message: String,
}

/// JSON body of the chat reply.
#[derive(Debug, Serialize)]
pub struct ChatReply {
    /// The assistant's reply text.
    pub response: String,
}

/// Builds the application router.
pub fn router<C: LLMClient + 'static>(state: Arc<AppState<C>>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chat", post(chat))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn chat<C: LLMClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Form(form): Form<ChatForm>,
) -> Json<ChatReply> {
    info!("Chat request received");
    let response = state.orchestrator.run_turn(&form.user_message).await;
    Json(ChatReply { response })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;

    use fedbrief_common::chat::Message;
    use fedbrief_common::client::{ChatRequest, ChatResponse, Config};
    use fedbrief_tools::ToolRegistry;

    struct CannedClient {
        config: Config,
        reply: String,
    }

    #[async_trait]
    impl LLMClient for CannedClient {
        fn config(&self) -> &Config {
            &self.config
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse> {
            Ok(ChatResponse {
                message: Message::assistant(&self.reply),
                model: "canned".to_string(),
                created_at: Utc::now(),
                response_id: None,
            })
        }

        fn supports_tools(&self) -> bool {
            true
        }
    }

    fn state_with_reply(reply: &str) -> Arc<AppState<CannedClient>> {
        let client = CannedClient {
            config: Config::new("canned"),
            reply: reply.to_string(),
        };
        Arc::new(AppState {
            orchestrator: Orchestrator::new(client, ToolRegistry::new()),
        })
    }

    #[tokio::test]
    async fn test_chat_returns_reply_json() {
        let state = state_with_reply("Hello from the model.");
        let form = ChatForm {
            user_message: "hi".to_string(),
        };

        let Json(reply) = chat(State(state), Form(form)).await;
        assert_eq!(reply.response, "Hello from the model.");
    }

    #[tokio::test]
    async fn test_index_serves_chat_page() {
        let Html(body) = index().await;
        assert!(body.contains("<html"));
        assert!(body.contains("user_message"));
    }

    #[test]
    fn test_chat_form_field_name() {
        let form: ChatForm =
            serde_json::from_str(r#"{"user_message": "any orders this week?"}"#).unwrap();
        assert_eq!(form.user_message, "any orders this week?");
    }
}
