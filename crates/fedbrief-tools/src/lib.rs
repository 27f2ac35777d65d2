//! # fedbrief-tools
//!
//! Tool framework for the fedbrief assistant.
//!
//! Defines the [`ToolImplementation`] trait tools implement, the
//! thread-safe [`ToolRegistry`] that maps tool names to implementations,
//! the SQLite-backed [`store::DocumentStore`], and the one production tool:
//! [`search::ExecutiveOrderSearchTool`].
//!
//! Argument parsing is deliberately not done here. Tool-call arguments
//! arrive from the backend in more than one shape, and the orchestrator
//! normalizes them once before calling [`ToolImplementation::execute`]
//! with a plain JSON object.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use fedbrief_tools::{ToolRegistry, ToolImplementation};
//! use fedbrief_tools::search::ExecutiveOrderSearchTool;
//! use fedbrief_tools::store::DocumentStore;
//!
//! # fn example() -> anyhow::Result<()> {
//! let store = Arc::new(DocumentStore::open_in_memory()?);
//! let registry = ToolRegistry::new();
//! registry.register(Arc::new(ExecutiveOrderSearchTool::new(store)));
//!
//! // Definitions sent to the model on every turn.
//! let definitions = registry.get_all_definitions();
//! assert_eq!(definitions.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use fedbrief_common::tools::Tool;

pub mod search;
pub mod store;

pub use search::{ExecutiveOrderSearchTool, SEARCH_TOOL_NAME};
pub use store::{DocumentStore, StoreError};

/// A tool callable by the model.
#[async_trait]
pub trait ToolImplementation: Send + Sync {
    /// The schema offered to the model.
    fn get_definition(&self) -> Tool;

    /// Executes the tool with normalized object arguments, returning the
    /// string handed back to the reply formatter.
    async fn execute(&self, args: &Value) -> Result<String>;

    /// Whether this tool may run without user confirmation.
    fn is_auto_approved(&self) -> bool {
        false
    }
}

/// Thread-safe registry mapping tool names to implementations.
pub struct ToolRegistry {
    tools: Arc<DashMap<String, Arc<dyn ToolImplementation>>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: Arc::new(DashMap::new()),
        }
    }

    /// Registers a tool under its declared name.
    pub fn register(&self, tool: Arc<dyn ToolImplementation>) {
        let name = tool.get_definition().function.name;
        self.tools.insert(name, tool);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolImplementation>> {
        self.tools.get(name).map(|r| r.value().clone())
    }

    /// All tool definitions, for transmission to the model.
    #[must_use]
    pub fn get_all_definitions(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.get_definition()).collect()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    #[must_use]
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.key().clone()).collect()
    }
}
