//! ```text
//! legislation.gov.uk ──► extract::LegislationFetcher ──► raw text + metadata
//!                                                            │
//!                      transform::normalize ◄────────────────┘
//!                                │
//!                      transform::chunk ──► store::MetadataStore (PostgreSQL)
//!                                                            │
//!                      embed::Embedder ◄── stored chunks ◄───┘
//!                                │
//!                      index::VectorIndex (Qdrant) ◄── points + payloads
//!
//! query text ──► query::QueryService ──► ranked chunks with provenance
//! ```
//!
//! The ingestion pipeline runs the top flow once per invocation; the query
//! service operates independently against the populated collection.

pub mod config;
pub mod embed;
pub mod extract;
pub mod index;
pub mod pipeline;
pub mod query;
pub mod store;
pub mod transform;
pub mod types;

pub use config::PipelineConfig;
pub use types::PipelineError;
