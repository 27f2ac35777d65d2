//! SQLite-backed document store.
//!
//! Holds the locally cached Federal Register documents the search tool
//! queries. The connection lives behind a mutex; callers on the async side
//! wrap store calls in `spawn_blocking`.

use std::path::Path;
use std::sync::Mutex;

use log::debug;
use rusqlite::{Connection, params, params_from_iter};
use serde::Serialize;
use thiserror::Error;

const LIMIT_RESULTS: usize = 10;

/// Errors from the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The connection mutex was poisoned by a panicking thread.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// A full document row, as written at ingestion time.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    /// Federal Register document number; the primary key.
    pub document_number: String,
    /// Document type, e.g. "Presidential Document".
    pub document_type: String,
    /// Document title.
    pub title: String,
    /// Publication date, ISO format. May carry a time component.
    pub publication_date: String,
    /// Abstract text, if one was retrievable.
    pub r#abstract: Option<String>,
    /// Link to the full document.
    pub html_url: String,
    /// When this row was fetched, ISO format.
    pub retrieval_date: String,
}

/// A search hit, shaped for the tool's JSON output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentSummary {
    /// Document title.
    pub title: String,
    /// Federal Register document number.
    pub document_number: String,
    /// Publication date, truncated to YYYY-MM-DD.
    pub publication_date: String,
    /// Link to the full document.
    pub html_url: String,
    /// Abstract text, with a placeholder when none is stored.
    pub r#abstract: String,
}

/// SQLite store of cached Federal Register documents.
///
/// All access is serialized through an internal mutex.
#[derive(Debug)]
pub struct DocumentStore {
    conn: Mutex<Connection>,
}

impl DocumentStore {
    /// Opens (or creates) the store at the given path and ensures the
    /// schema exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Opens an in-memory store. Used in tests and for dry runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS federal_documents (
                document_number TEXT PRIMARY KEY,
                document_type TEXT,
                title TEXT,
                publication_date TEXT,
                abstract TEXT,
                html_url TEXT,
                retrieval_date TEXT
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Inserts a document, replacing any existing row with the same
    /// document number.
    ///
    /// # Errors
    ///
    /// Returns an error on SQLite failure or a poisoned lock.
    pub fn upsert(&self, record: &DocumentRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        conn.execute(
            "INSERT OR REPLACE INTO federal_documents
                (document_number, document_type, title, publication_date,
                 abstract, html_url, retrieval_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.document_number,
                record.document_type,
                record.title,
                record.publication_date,
                record.r#abstract,
                record.html_url,
                record.retrieval_date,
            ],
        )?;
        Ok(())
    }

    /// Number of cached documents.
    ///
    /// # Errors
    ///
    /// Returns an error on SQLite failure or a poisoned lock.
    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let count = conn.query_row("SELECT COUNT(*) FROM federal_documents", [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    /// Searches Presidential Documents published within the inclusive date
    /// range, optionally filtered by keywords.
    ///
    /// Dates are `YYYY-MM-DD` strings and compare against the first ten
    /// characters of the stored publication date. Keyword tokens match
    /// case-insensitively as substrings of the title or abstract, OR-ed
    /// across tokens. At most ten results are returned, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error on SQLite failure or a poisoned lock.
    pub fn search(
        &self,
        start_date: &str,
        end_date: &str,
        keywords: &[String],
    ) -> Result<Vec<DocumentSummary>, StoreError> {
        let mut sql = String::from(
            "SELECT title, document_number, SUBSTR(publication_date, 1, 10), html_url, abstract
             FROM federal_documents
             WHERE document_type = 'Presidential Document'
               AND SUBSTR(publication_date, 1, 10) BETWEEN ?1 AND ?2",
        );

        let mut bindings: Vec<String> = vec![start_date.to_string(), end_date.to_string()];

        if !keywords.is_empty() {
            let clauses: Vec<&str> = keywords
                .iter()
                .map(|_| "(LOWER(title) LIKE ? OR LOWER(abstract) LIKE ?)")
                .collect();
            sql.push_str(" AND (");
            sql.push_str(&clauses.join(" OR "));
            sql.push(')');

            for keyword in keywords {
                let pattern = format!("%{}%", keyword.to_lowercase());
                bindings.push(pattern.clone());
                bindings.push(pattern);
            }
        }

        sql.push_str(" ORDER BY publication_date DESC LIMIT ");
        sql.push_str(&LIMIT_RESULTS.to_string());

        debug!(
            "document search: range {start_date}..{end_date}, {} keyword token(s)",
            keywords.len()
        );

        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bindings.iter()), |row| {
            Ok(DocumentSummary {
                title: row.get(0)?,
                document_number: row.get(1)?,
                publication_date: row.get(2)?,
                html_url: row.get(3)?,
                r#abstract: row
                    .get::<_, Option<String>>(4)?
                    .unwrap_or_else(|| "No abstract available.".to_string()),
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}
