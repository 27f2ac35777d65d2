//! Federal Register ingestion.
//!
//! Fetches documents of the configured type for a trailing publication
//! window and upserts them into the local SQLite cache. Per-document
//! failures are logged and skipped; only a failed API request or a store
//! failure aborts the run.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, Local};
use serde::Deserialize;
use tracing::{error, info, warn};

use fedbrief_tools::store::{DocumentRecord, DocumentStore};

use crate::config::IngestionConfig;
use crate::error::{Result, ServerError};

const ABSTRACT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const ABSTRACT_FETCH_FAILED: &str = "Abstract fetch failed.";

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Copy)]
pub struct IngestReport {
    /// Documents returned by the API.
    pub fetched: usize,
    /// Documents written to the store.
    pub stored: usize,
}

/// One document as returned by the Federal Register documents endpoint.
/// Fields the API omits come through as defaults; rows without a document
/// number are skipped.
#[derive(Debug, Deserialize)]
struct ApiDocument {
    #[serde(default)]
    document_number: String,
    #[serde(default, rename = "type")]
    document_type: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    publication_date: String,
    #[serde(default)]
    abstract_html_url: Option<String>,
    #[serde(default)]
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    results: Vec<ApiDocument>,
}

/// Fetches the configured publication window and upserts every document.
///
/// # Errors
///
/// Returns an error if the API request fails or the store cannot be
/// written. Individual abstract fetches and row writes fail soft.
pub async fn run_ingestion(
    store: &Arc<DocumentStore>,
    config: &IngestionConfig,
) -> Result<IngestReport> {
    let end_date = Local::now().date_naive();
    let start_date = end_date
        .checked_sub_days(Days::new(u64::from(config.window_days.saturating_sub(1))))
        .unwrap_or(end_date);

    info!(
        "Fetching Federal Register documents from {start_date} to {end_date} (type {})",
        config.document_type
    );

    let client = reqwest::Client::new();
    let response = client
        .get(&config.api_base_url)
        .query(&[
            ("per_page", "50"),
            ("order", "newest"),
            (
                "conditions[publication_date][gte]",
                &start_date.format("%Y-%m-%d").to_string(),
            ),
            (
                "conditions[publication_date][lte]",
                &end_date.format("%Y-%m-%d").to_string(),
            ),
            ("conditions[type]", &config.document_type),
        ])
        .send()
        .await
        .map_err(|e| ServerError::Ingestion(format!("API request failed: {e}")))?
        .error_for_status()
        .map_err(|e| ServerError::Ingestion(format!("API returned an error status: {e}")))?;

    let data: ApiResponse = response
        .json()
        .await
        .map_err(|e| ServerError::Ingestion(format!("Failed to parse API response: {e}")))?;

    let fetched = data.results.len();
    info!("Found {fetched} documents in the API response");

    let mut records = Vec::with_capacity(fetched);
    for doc in data.results {
        if doc.document_number.is_empty() {
            warn!("Skipping API document with no document number");
            continue;
        }
        let r#abstract = match &doc.abstract_html_url {
            Some(url) => Some(fetch_abstract(&client, &doc.document_number, url).await),
            None => None,
        };
        records.push(DocumentRecord {
            document_number: doc.document_number,
            document_type: doc.document_type,
            title: doc.title,
            publication_date: doc.publication_date,
            r#abstract,
            html_url: doc.html_url,
            retrieval_date: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        });
    }

    let store = Arc::clone(store);
    let stored = tokio::task::spawn_blocking(move || {
        let mut stored = 0;
        for record in &records {
            match store.upsert(record) {
                Ok(()) => stored += 1,
                Err(e) => error!(
                    "Error inserting/updating document {}: {e}",
                    record.document_number
                ),
            }
        }
        stored
    })
    .await
    .map_err(|e| ServerError::Ingestion(format!("Store task failed: {e}")))?;

    info!("Ingestion complete: stored {stored} of {fetched} documents");
    Ok(IngestReport { fetched, stored })
}

/// Fetches the abstract body for one document, with a short timeout.
/// Any failure yields a placeholder rather than aborting the run.
async fn fetch_abstract(client: &reqwest::Client, document_number: &str, url: &str) -> String {
    let body = match client
        .get(url)
        .timeout(ABSTRACT_FETCH_TIMEOUT)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
    {
        Ok(response) => response.text().await,
        Err(e) => {
            warn!("Could not fetch abstract for {document_number} from {url}: {e}");
            return ABSTRACT_FETCH_FAILED.to_string();
        }
    };

    match body {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!("Could not read abstract body for {document_number}: {e}");
            ABSTRACT_FETCH_FAILED.to_string()
        }
    }
}
