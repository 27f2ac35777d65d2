//! # fedbrief
//!
//! Turn orchestration for the fedbrief daily-briefing assistant.
//!
//! The [`Orchestrator`] runs one chat turn at a time: it sends the rolling
//! conversation plus the user's message to an OpenAI-compatible backend,
//! classifies the response, executes at most one tool call against the
//! registry, formats the result, and records the exchange in history.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fedbrief::Orchestrator;
//! use fedbrief_client::openai::OpenAIClient;
//! use fedbrief_common::client::Config;
//! use fedbrief_tools::search::ExecutiveOrderSearchTool;
//! use fedbrief_tools::store::DocumentStore;
//! use fedbrief_tools::ToolRegistry;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = Arc::new(DocumentStore::open("federal_register.db")?);
//! let registry = ToolRegistry::new();
//! registry.register(Arc::new(ExecutiveOrderSearchTool::new(store)));
//!
//! let client = OpenAIClient::new(Config::default())?;
//! let orchestrator = Orchestrator::new(client, registry);
//!
//! let reply = orchestrator.run_turn("any executive orders on trade this week?").await;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```
//!
//! A turn never fails: every internal error resolves to fixed user-facing
//! text, and the turn is recorded either way.

pub mod classify;
pub mod core;
pub mod error;
pub mod format;

pub use classify::{TurnAction, classify_response};
pub use core::Orchestrator;
pub use error::TurnError;
pub use format::{ToolReply, format_tool_output};
