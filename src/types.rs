//! Shared record types and the pipeline error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures the pipeline can produce, one variant per subsystem.
///
/// Per-document failures (`Fetch`, and `Store` during a single document's
/// save) are recovered by the pipeline loop: logged with context, then the
/// run continues. `Embedding` and `IndexWrite` are batch-wide and abort the
/// run. `IndexQuery` is surfaced to the caller so "no matches" stays
/// distinguishable from "search failed".
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("metadata store error: {0}")]
    Store(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("vector index write failed: {0}")]
    IndexWrite(String),

    #[error("vector index query failed: {0}")]
    IndexQuery(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Metadata describing one legislative instrument, keyed by `source_url`.
///
/// `year` and `number` stay as strings: the portal renders them inside prose
/// headings ("2024 No. 123") and several instrument types carry non-numeric
/// designations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub year: String,
    pub number: String,
    pub doc_type: String,
    pub date: String,
    pub source_url: String,
}
