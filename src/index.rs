//! Qdrant REST client: collection lifecycle, point upsert, k-NN search.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::PipelineError;

/// Denormalized provenance carried on every point, sufficient to present a
/// retrieval result without a join back to the metadata store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub text: String,
    pub legislation_id: i64,
    pub chunk_number: i32,
    pub source_url: String,
}

/// One point ready for upsert.
#[derive(Debug, Clone, Serialize)]
pub struct PointRecord {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// One search hit, best first.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredChunk {
    pub score: f32,
    pub payload: ChunkPayload,
}

/// Deterministic point identity for a chunk.
///
/// Derived from `(legislation_id, chunk_number)` so re-running the indexing
/// stage overwrites points instead of accumulating duplicates.
pub fn point_id(legislation_id: i64, chunk_number: i32) -> Uuid {
    let name = format!("legisearch/{legislation_id}/{chunk_number}");
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
}

/// Thin client over the Qdrant HTTP API.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    points: &'a [PointRecord],
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<ScoredChunk>,
}

impl VectorIndex {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Drops and recreates `collection` with the given dimensionality and
    /// cosine distance. Destructive: existing points are gone afterwards.
    pub async fn recreate_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> Result<(), PipelineError> {
        let url = format!("{}/collections/{collection}", self.base_url);

        // A missing collection is fine here; only creation failures matter.
        match self.client.delete(&url).send().await {
            Ok(response) => debug!(collection, status = %response.status(), "collection delete"),
            Err(err) => debug!(collection, error = %err, "collection delete skipped"),
        }

        let response = self
            .client
            .put(&url)
            .json(&CreateCollectionRequest {
                vectors: VectorParams {
                    size: dimension,
                    distance: "Cosine",
                },
            })
            .send()
            .await
            .map_err(|err| PipelineError::IndexWrite(format!("create collection: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = error_body(response).await;
            return Err(PipelineError::IndexWrite(format!(
                "create collection failed ({status}): {body}"
            )));
        }

        info!(collection, dimension, "collection recreated");
        Ok(())
    }

    /// Upserts a batch of points, waiting for the write to be applied.
    /// A no-op on empty input. Failures surface whole; nothing is retried.
    pub async fn upsert(
        &self,
        collection: &str,
        points: &[PointRecord],
    ) -> Result<(), PipelineError> {
        if points.is_empty() {
            debug!(collection, "no points to upsert");
            return Ok(());
        }

        let url = format!(
            "{}/collections/{collection}/points?wait=true",
            self.base_url
        );
        let response = self
            .client
            .put(&url)
            .json(&UpsertRequest { points })
            .send()
            .await
            .map_err(|err| PipelineError::IndexWrite(format!("upsert points: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = error_body(response).await;
            return Err(PipelineError::IndexWrite(format!(
                "upsert of {} points failed ({status}): {body}",
                points.len()
            )));
        }

        info!(collection, count = points.len(), "points upserted");
        Ok(())
    }

    /// k-nearest-neighbor search, results ordered by descending score.
    /// Returns fewer than `limit` hits when the collection holds fewer
    /// points.
    pub async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, PipelineError> {
        let url = format!("{}/collections/{collection}/points/search", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SearchRequest {
                vector,
                limit,
                with_payload: true,
            })
            .send()
            .await
            .map_err(|err| PipelineError::IndexQuery(format!("search: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = error_body(response).await;
            return Err(PipelineError::IndexQuery(format!(
                "search failed ({status}): {body}"
            )));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::IndexQuery(format!("malformed search response: {err}")))?;

        Ok(payload.result)
    }
}

async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string())
}
