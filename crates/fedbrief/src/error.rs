//! Turn-level error taxonomy.
//!
//! Every failure mode of a chat turn has a variant here, and every variant
//! has exactly one user-facing rendering via [`TurnError::user_text`]. The
//! orchestrator converts errors to text in one place; nothing in the turn
//! path ever surfaces an error to the transport layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TurnError {
    /// The backend call itself failed (network, timeout, API error).
    #[error("backend request failed: {0}")]
    Backend(#[source] anyhow::Error),

    /// Tool arguments arrived as a string that is not valid JSON.
    #[error("invalid arguments for tool '{name}'")]
    InvalidArguments {
        /// Name of the tool the model tried to call.
        name: String,
    },

    /// Tool arguments parsed, but not to an object.
    #[error("arguments for tool '{name}' had an unexpected type")]
    ArgumentShape {
        /// Name of the tool the model tried to call.
        name: String,
    },

    /// The model named a tool that is not in the registry.
    #[error("tool '{name}' is not registered")]
    UnknownTool {
        /// The unrecognized tool name.
        name: String,
    },

    /// The tool was invoked and its execution failed.
    #[error("tool '{name}' execution failed: {source}")]
    Execution {
        /// Name of the tool that failed.
        name: String,
        /// The underlying failure.
        #[source]
        source: anyhow::Error,
    },
}

impl TurnError {
    /// The polite reply shown to the user for this failure.
    #[must_use]
    pub fn user_text(&self) -> String {
        match self {
            Self::Backend(_) => {
                "Sorry, an unexpected error occurred while processing your request.".to_string()
            }
            Self::InvalidArguments { name } => {
                format!("Error: Invalid arguments for tool {name}.")
            }
            Self::ArgumentShape { name } => {
                format!("Error: Tool arguments for {name} had an unexpected type.")
            }
            Self::UnknownTool { name } => format!("Error: Tool '{name}' is not available."),
            Self::Execution { name, .. } => format!("System error during {name} execution."),
        }
    }
}
