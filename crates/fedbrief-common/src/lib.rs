//! # fedbrief-common
//!
//! Shared types for the fedbrief daily-briefing assistant.
//!
//! This crate defines the vocabulary the rest of the workspace speaks:
//!
//! - [`chat`]: message roles and the [`chat::Message`] type exchanged with
//!   the model backend
//! - [`tools`]: tool schemas offered to the model and the tool-call types
//!   it answers with
//! - [`history`]: the bounded rolling conversation buffer
//! - [`client`]: backend configuration and the chat request/response pair

pub mod chat;
pub mod client;
pub mod history;
pub mod tools;

pub use chat::{Message, MessageRole};
pub use client::{ChatRequest, ChatResponse, Config};
pub use history::History;
pub use tools::{Function, FunctionCall, Parameters, Property, Tool, ToolArguments, ToolCall};
