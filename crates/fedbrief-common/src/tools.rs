//! Tool schema and tool-call types.
//!
//! A [`Tool`] describes a function to the model backend; a [`ToolCall`] is
//! the model's request to invoke one. Arguments can arrive from the backend
//! either as a JSON-encoded string or as a structured object, so they are
//! modeled as an explicit [`ToolArguments`] union and resolved once at the
//! orchestrator's normalization boundary rather than by ad hoc inspection.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Describes a single property in a function parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Property {
    /// The JSON type (e.g. "string").
    #[serde(rename = "type")]
    pub prop_type: String,
    /// Human-readable description of this property.
    pub description: String,
}

impl Property {
    /// Creates a string property.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            prop_type: "string".to_string(),
            description: description.into(),
        }
    }
}

/// Parameter schema for a function, following JSON Schema conventions.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Parameters {
    /// The JSON type, always "object".
    #[serde(rename = "type")]
    pub param_type: String,
    /// Map of parameter names to their property definitions.
    pub properties: HashMap<String, Property>,
    /// List of required parameter names.
    pub required: Vec<String>,
}

impl Parameters {
    /// Creates a new `Parameters` with type "object".
    #[must_use]
    pub fn new(properties: HashMap<String, Property>, required: Vec<String>) -> Self {
        Self {
            param_type: "object".to_string(),
            properties,
            required,
        }
    }

    /// Fallible conversion to `serde_json::Value`.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if serialization fails (all fields
    /// serialize infallibly in practice).
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Describes a function that can be called by the model.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Function {
    /// The name of the function.
    pub name: String,
    /// Human-readable description of what the function does.
    pub description: String,
    /// JSON Schema definition of the function's parameters.
    pub parameters: Value,
}

/// A tool offered to the model, wrapping a function definition.
///
/// Built once at startup and transmitted verbatim on every turn.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Tool {
    /// The type of tool, always "function".
    #[serde(rename = "type", default = "default_tool_type")]
    pub r#type: String,
    /// The function definition.
    pub function: Function,
}

fn default_tool_type() -> String {
    "function".to_string()
}

impl Tool {
    /// Wraps a function definition in the standard "function" tool type.
    #[must_use]
    pub fn function(function: Function) -> Self {
        Self {
            r#type: default_tool_type(),
            function,
        }
    }
}

/// Tool-call arguments as received from the backend.
///
/// Some backends emit arguments as a JSON-encoded string, others as a
/// structured object. Both are valid input; the orchestrator resolves the
/// union exactly once before invoking a tool. Any other JSON shape is
/// preserved so the normalization step can reject it explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ToolArguments {
    /// A JSON-encoded string, e.g. `"{\"query_keywords\": \"climate\"}"`.
    Raw(String),
    /// An already-structured argument object.
    Structured(serde_json::Map<String, Value>),
    /// Anything else the backend produced (arrays, numbers, null).
    /// Never invokable; rejected during normalization.
    Other(Value),
}

impl ToolArguments {
    /// An empty structured argument set.
    #[must_use]
    pub fn empty() -> Self {
        Self::Structured(serde_json::Map::new())
    }
}

impl Default for ToolArguments {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for ToolArguments {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Raw(s),
            Value::Object(map) => Self::Structured(map),
            other => Self::Other(other),
        }
    }
}

/// An invocation of a function with arguments.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FunctionCall {
    /// The name of the function being called.
    pub name: String,
    /// The arguments, in whichever shape the backend produced.
    #[serde(default)]
    pub arguments: ToolArguments,
}

/// A complete tool call from the model, including its id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCall {
    /// Unique identifier for this tool call.
    pub id: String,
    /// The function being invoked.
    pub function: FunctionCall,
    /// The type of call, typically "function".
    pub call_type: String,
}

impl ToolCall {
    /// Creates a new tool call with a generated id.
    pub fn new(name: impl Into<String>, arguments: ToolArguments) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
            call_type: "function".to_string(),
        }
    }

    /// Creates a synthetic tool call for a payload that named no function.
    ///
    /// Used when the model emits an argument-only call and exactly one tool
    /// was offered; the id records how the call was reconstructed.
    pub fn assumed(name: impl Into<String>, arguments: ToolArguments) -> Self {
        let name = name.into();
        Self {
            id: format!("content_assumed_tool_{name}"),
            function: FunctionCall { name, arguments },
            call_type: "function".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_serialization() {
        let prop = Property::string("Optional keywords");
        let json = serde_json::to_value(&prop).unwrap();
        assert_eq!(json["type"], "string");
        assert_eq!(json["description"], "Optional keywords");
    }

    #[test]
    fn test_parameters_to_value() {
        let mut properties = HashMap::new();
        properties.insert("date_range_str".to_string(), Property::string("Date range"));
        let params = Parameters::new(properties, vec![]);

        let value = params.to_value().unwrap();
        assert_eq!(value["type"], "object");
        assert_eq!(value["properties"]["date_range_str"]["type"], "string");
        assert!(value["required"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_tool_serialization() {
        let tool = Tool::function(Function {
            name: "search_federal_executive_orders".to_string(),
            description: "Searches executive orders".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        });

        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["type"], "function");
        assert_eq!(value["function"]["name"], "search_federal_executive_orders");
    }

    #[test]
    fn test_arguments_deserialize_string_form() {
        let args: ToolArguments =
            serde_json::from_value(json!(r#"{"query_keywords": "climate"}"#)).unwrap();
        assert!(matches!(args, ToolArguments::Raw(_)));
    }

    #[test]
    fn test_arguments_deserialize_structured_form() {
        let args: ToolArguments =
            serde_json::from_value(json!({"query_keywords": "climate"})).unwrap();
        match args {
            ToolArguments::Structured(map) => {
                assert_eq!(map.get("query_keywords"), Some(&json!("climate")));
            }
            other => panic!("expected structured arguments, got {other:?}"),
        }
    }

    #[test]
    fn test_arguments_deserialize_other_shape() {
        let args: ToolArguments = serde_json::from_value(json!([1, 2, 3])).unwrap();
        assert!(matches!(args, ToolArguments::Other(_)));
    }

    #[test]
    fn test_tool_call_unique_ids() {
        let a = ToolCall::new("search", ToolArguments::empty());
        let b = ToolCall::new("search", ToolArguments::empty());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_assumed_tool_call_id() {
        let call = ToolCall::assumed("search_federal_executive_orders", ToolArguments::empty());
        assert_eq!(call.id, "content_assumed_tool_search_federal_executive_orders");
        assert_eq!(call.function.name, "search_federal_executive_orders");
        assert_eq!(call.call_type, "function");
    }
}
