//! The executive-order search tool.
//!
//! Translates a date-range token and optional keyword string into a query
//! against the [`DocumentStore`] and renders the outcome as a JSON string
//! for the model: an array of matching documents, a `{"message": ...}`
//! marker when nothing matched, or an `{"error": ...}` marker on failure.
//! Failures never propagate as errors; the markers keep the turn alive.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use log::{error, info, warn};
use serde_json::{Value, json};

use fedbrief_common::tools::{Function, Parameters, Property, Tool};

use crate::ToolImplementation;
use crate::store::DocumentStore;

/// Tool name as offered to the model.
pub const SEARCH_TOOL_NAME: &str = "search_federal_executive_orders";

const DEFAULT_DATE_RANGE: &str = "last_7_days";

const DB_ERROR_MESSAGE: &str = "A database error occurred.";
const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred in the tool.";
const NO_RESULTS_MESSAGE: &str =
    "No relevant executive orders found matching your criteria in the database.";

/// Resolves a date-range token to an inclusive [start, end] window anchored
/// at `today`.
///
/// Recognized tokens: `today`, `yesterday`, `last_7_days`, `last_30_days`,
/// `last_year`. Anything else is first tried as an exact `YYYY-MM-DD` date;
/// on parse failure the window silently falls back to the last seven days
/// with a logged warning.
#[must_use]
pub fn resolve_date_range(date_range_str: &str, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match date_range_str {
        "today" => (today, today),
        "yesterday" => {
            let day = today - Duration::days(1);
            (day, day)
        }
        "last_7_days" => (today - Duration::days(6), today),
        "last_30_days" => (today - Duration::days(29), today),
        "last_year" => (today - Duration::days(365), today),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d").map_or_else(
            |_| {
                warn!("Unrecognized date_range_str '{other}', defaulting to last_7_days.");
                (today - Duration::days(6), today)
            },
            |day| (day, day),
        ),
    }
}

/// Splits a keyword string into lowercase whitespace-separated tokens.
///
/// Blank input yields no tokens, which disables keyword filtering.
#[must_use]
pub fn keyword_tokens(query_keywords: &str) -> Vec<String> {
    query_keywords
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// Searches the cached executive-order table by date range and keywords.
pub struct ExecutiveOrderSearchTool {
    store: Arc<DocumentStore>,
}

impl ExecutiveOrderSearchTool {
    /// Creates the tool over the given store.
    #[must_use]
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolImplementation for ExecutiveOrderSearchTool {
    fn get_definition(&self) -> Tool {
        let mut properties = HashMap::new();
        properties.insert(
            "date_range_str".to_string(),
            Property::string(
                "The date range for the search. Options: 'today', 'yesterday', 'last_7_days' (default), \
                 'last_30_days', 'last_year', or a specific date in 'YYYY-MM-DD' format. \
                 If not specified, defaults to 'last_7_days'.",
            ),
        );
        properties.insert(
            "query_keywords".to_string(),
            Property::string(
                "Optional keywords to search for in the title or abstract of executive orders. \
                 E.g., 'national security' or 'economy healthcare'. \
                 If no specific keywords, this can be omitted or an empty string.",
            ),
        );

        let parameters = Parameters::new(properties, vec![]);

        Tool::function(Function {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Searches for federal executive orders in the database based on optional keywords and a date range. \
                 Use this to find specific executive orders or those published recently. \
                 Supported date ranges: 'today', 'yesterday', 'last_7_days' (default), 'last_30_days', \
                 'last_year', or a specific date in 'YYYY-MM-DD' format. \
                 Example usage: 'search executive orders for the last 30 days', \
                 'find executive orders related to climate change in 2023', \
                 'executive orders about healthcare since January 1, 2024'."
                .to_string(),
            parameters: parameters
                .to_value()
                .unwrap_or_else(|_| json!({"type": "object", "properties": {}})),
        })
    }

    async fn execute(&self, args: &Value) -> Result<String> {
        let query_keywords = args
            .get("query_keywords")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let date_range_str = args
            .get("date_range_str")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_DATE_RANGE);

        info!(
            "[Tool Executing] {SEARCH_TOOL_NAME} | Keywords: '{query_keywords}', Date Range: '{date_range_str}'"
        );

        let today = Local::now().date_naive();
        let (start, end) = resolve_date_range(date_range_str, today);
        let start_date = start.format("%Y-%m-%d").to_string();
        let end_date = end.format("%Y-%m-%d").to_string();
        let keywords = keyword_tokens(query_keywords);

        let store = Arc::clone(&self.store);
        let outcome =
            tokio::task::spawn_blocking(move || store.search(&start_date, &end_date, &keywords))
                .await;

        let documents = match outcome {
            Ok(Ok(documents)) => documents,
            Ok(Err(e)) => {
                error!("Database error: {e}");
                return Ok(json!({"error": DB_ERROR_MESSAGE}).to_string());
            }
            Err(e) => {
                error!("Unexpected tool error: {e}");
                return Ok(json!({"error": UNEXPECTED_ERROR_MESSAGE}).to_string());
            }
        };

        if documents.is_empty() {
            info!("No documents found.");
            return Ok(json!({"message": NO_RESULTS_MESSAGE}).to_string());
        }

        info!("Found {} documents.", documents.len());
        match serde_json::to_string(&documents) {
            Ok(rendered) => Ok(rendered),
            Err(e) => {
                error!("Unexpected tool error: {e}");
                Ok(json!({"error": UNEXPECTED_ERROR_MESSAGE}).to_string())
            }
        }
    }

    fn is_auto_approved(&self) -> bool {
        true // read-only query over the local cache
    }
}
