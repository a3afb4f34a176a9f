//! Batch text embedding behind a trait seam.
//!
//! The pipeline and query service share one [`Embedder`]; mixing models
//! between index time and query time invalidates similarity scores, so both
//! binaries construct the embedder from the same configuration.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::types::PipelineError;

/// Batch-capable text-to-vector mapping.
///
/// Implementations must return exactly one vector per input text, in input
/// order. Callers zip texts to vectors positionally, so a shorter or
/// reordered response must surface as an error, never as partial output.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a batch of texts. Empty input yields empty output.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;

    /// Output dimensionality of every vector this embedder produces.
    fn dimension(&self) -> usize;
}

/// Embedder backed by a JSON inference endpoint.
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(client: Client, config: &EmbeddingConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            dimension: config.dimension,
        }
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Inference services answer either `{"data": [{"embedding": [..], "index": n}]}`
/// or the bare `{"embeddings": [[..]]}` form; accept both.
#[derive(Deserialize)]
struct InferenceResponse {
    #[serde(default)]
    data: Vec<InferenceItem>,
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct InferenceItem {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

impl InferenceResponse {
    fn into_vectors(self, expected: usize) -> Result<Vec<Vec<f32>>, PipelineError> {
        if !self.data.is_empty() {
            if self.data.len() != expected {
                return Err(PipelineError::Embedding(format!(
                    "endpoint returned {} vectors for {} texts",
                    self.data.len(),
                    expected
                )));
            }
            let mut data = self.data;
            data.sort_by_key(|item| item.index.unwrap_or(0));
            return Ok(data.into_iter().map(|item| item.embedding).collect());
        }
        if self.embeddings.len() == expected {
            return Ok(self.embeddings);
        }
        Err(PipelineError::Embedding(format!(
            "endpoint returned {} vectors for {} texts",
            self.embeddings.len(),
            expected
        )))
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = InferenceRequest {
            model: &self.model,
            input: texts,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| PipelineError::Embedding(err.to_string()))?;

        let payload: InferenceResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::Embedding(format!("malformed response: {err}")))?;

        payload.into_vectors(texts.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Deterministic hash-derived embedder for tests and offline runs.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        Ok(texts
            .iter()
            .map(|text| hash_to_vec(text, self.dimension))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn hash_to_vec(text: &str, dimension: usize) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();
    (0..dimension)
        .map(|i| {
            let bits = seed.rotate_left((i % 64) as u32) ^ ((i as u64) << 24);
            (bits as f32) / u32::MAX as f32
        })
        .collect()
}
