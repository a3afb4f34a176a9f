//! Query-time retrieval over the populated collection.

use std::sync::Arc;

use tracing::instrument;

use crate::embed::Embedder;
use crate::index::VectorIndex;
use crate::types::PipelineError;

/// Default number of results returned per query.
pub const DEFAULT_TOP_K: usize = 4;

/// One retrieval result with full provenance.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub score: f32,
    pub source_url: String,
    pub chunk_number: i32,
    pub text: String,
}

/// Embeds free-text queries and searches the vector index.
///
/// Must be built with the same embedder configuration the ingest run used;
/// scores are only meaningful within one embedding space.
pub struct QueryService {
    embedder: Arc<dyn Embedder>,
    index: VectorIndex,
    collection: String,
}

impl QueryService {
    pub fn new(embedder: Arc<dyn Embedder>, index: VectorIndex, collection: impl Into<String>) -> Self {
        Self {
            embedder,
            index,
            collection: collection.into(),
        }
    }

    /// Returns the `k` chunks nearest to `text`, best first; fewer when
    /// the collection holds fewer points, `Ok(vec![])` when nothing
    /// matches. A backend failure is an error, not an empty result.
    #[instrument(skip(self, text), err)]
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<RetrievedChunk>, PipelineError> {
        let vectors = self.embedder.embed_batch(&[text.to_string()]).await?;
        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Embedding("no vector for query text".to_string()))?;

        let hits = self.index.search(&self.collection, &vector, k).await?;

        Ok(hits
            .into_iter()
            .map(|hit| RetrievedChunk {
                score: hit.score,
                source_url: hit.payload.source_url,
                chunk_number: hit.payload.chunk_number,
                text: hit.payload.text,
            })
            .collect())
    }
}
