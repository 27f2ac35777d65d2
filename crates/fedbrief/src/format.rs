//! Tool-output formatting.
//!
//! The search tool hands back a JSON string: an array of documents, a
//! `{"message": ...}` no-results marker, or an `{"error": ...}` marker.
//! [`format_tool_output`] is a pure, deterministic mapping from that string
//! to reply text, and [`ToolReply`] tells the orchestrator whether the
//! affirmative lead-in belongs in front of it.

use log::warn;
use serde_json::Value;

/// Prefix applied to document listings, and only to document listings.
pub const FINDINGS_LEAD_IN: &str =
    "Okay, I found the following executive orders based on your request:\n\n";

const NO_RESULTS_TEXT: &str = "No executive orders found for the given criteria.";
const UNUSUAL_RESPONSE_TEXT: &str = "Received an unusual response from the search tool.";

/// A formatted tool result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolReply {
    /// Document listing; the orchestrator prefixes the lead-in.
    Findings(String),
    /// No-results or error text; becomes the reply verbatim.
    Terminal(String),
}

impl ToolReply {
    /// Renders the final reply text, lead-in included where it applies.
    #[must_use]
    pub fn into_reply_text(self) -> String {
        match self {
            Self::Findings(body) => format!("{FINDINGS_LEAD_IN}{body}"),
            Self::Terminal(text) => text,
        }
    }
}

/// Maps the tool's raw JSON output to reply text.
#[must_use]
pub fn format_tool_output(raw: &str) -> ToolReply {
    let Ok(data) = serde_json::from_str::<Value>(raw) else {
        warn!("Tool returned non-JSON output: {:.200}", raw);
        return ToolReply::Terminal(UNUSUAL_RESPONSE_TEXT.to_string());
    };

    match data {
        Value::Object(obj) if obj.contains_key("message") => {
            ToolReply::Terminal(NO_RESULTS_TEXT.to_string())
        }
        Value::Object(obj) => obj.get("error").and_then(Value::as_str).map_or_else(
            || {
                warn!("Tool returned unexpected object: {:.200}", raw);
                ToolReply::Terminal(UNUSUAL_RESPONSE_TEXT.to_string())
            },
            |message| ToolReply::Terminal(format!("Error from tool: {message}")),
        ),
        Value::Array(docs) if docs.is_empty() => {
            ToolReply::Terminal(NO_RESULTS_TEXT.to_string())
        }
        Value::Array(docs) => ToolReply::Findings(render_documents(&docs)),
        _ => {
            warn!("Tool returned unexpected data: {:.200}", raw);
            ToolReply::Terminal(UNUSUAL_RESPONSE_TEXT.to_string())
        }
    }
}

/// Renders each document as a fixed four-line bullet block, blocks joined
/// by a horizontal rule, in input order (already newest-first).
fn render_documents(docs: &[Value]) -> String {
    let blocks: Vec<String> = docs
        .iter()
        .map(|doc| {
            let field = |key: &str| doc.get(key).and_then(Value::as_str).unwrap_or("N/A");
            let link = doc.get("html_url").and_then(Value::as_str).unwrap_or("#");
            format!(
                "- **Title:** {}\n- **Document Number:** {}\n- **Publication Date:** {}\n- **Link:** [Read Document]({})",
                field("title"),
                field("document_number"),
                field("publication_date"),
                link,
            )
        })
        .collect();
    blocks.join("\n---\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_two_documents_rendered_in_order() {
        let raw = json!([
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
        .to_string();

        let reply = format_tool_output(&raw).into_reply_text();
        assert!(reply.starts_with(FINDINGS_LEAD_IN));
        assert_eq!(reply.matches("\n---\n").count(), 1);

        let tariffs = reply.find("Trade and Tariffs").unwrap();
        let energy = reply.find("Energy Independence").unwrap();
        assert!(tariffs < energy);
        assert!(reply.contains("- **Document Number:** 2025-003"));
        assert!(
            reply.contains("- **Link:** [Read Document](https://www.federalregister.gov/d/2025-003)")
        );
    }

    #[test]
    fn test_empty_array_is_no_results_without_lead_in() {
        let reply = format_tool_output("[]").into_reply_text();
        assert_eq!(reply, "No executive orders found for the given criteria.");
    }

    #[test]
    fn test_message_marker_is_no_results() {
        let raw = json!({"message": "No relevant executive orders found matching your criteria in the database."})
            .to_string();
        let reply = format_tool_output(&raw).into_reply_text();
        assert_eq!(reply, "No executive orders found for the given criteria.");
    }

    #[test]
    fn test_error_marker_rendered_verbatim() {
        let raw = json!({"error": "A database error occurred."}).to_string();
        let reply = format_tool_output(&raw).into_reply_text();
        assert_eq!(reply, "Error from tool: A database error occurred.");
    }

    #[test]
    fn test_non_json_is_unusual_response() {
        let reply = format_tool_output("definitely not json").into_reply_text();
        assert_eq!(reply, "Received an unusual response from the search tool.");
    }

    #[test]
    fn test_unexpected_shape_is_unusual_response() {
        let reply = format_tool_output("42").into_reply_text();
        assert_eq!(reply, "Received an unusual response from the search tool.");
    }

    #[test]
    fn test_missing_fields_fall_back_to_placeholders() {
        let raw = json!([{"title": "Only a Title"}]).to_string();
        let reply = format_tool_output(&raw).into_reply_text();
        assert!(reply.contains("- **Document Number:** N/A"));
        assert!(reply.contains("- **Link:** [Read Document](#)"));
    }
}
