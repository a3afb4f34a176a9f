//! End-to-end ingestion: extract, transform, load, embed, index.

use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::{DEFAULT_COLLECTION, PipelineConfig};
use crate::embed::{Embedder, HttpEmbedder};
use crate::extract::{LegislationFetcher, ListingEntry};
use crate::index::{ChunkPayload, PointRecord, VectorIndex, point_id};
use crate::store::MetadataStore;
use crate::transform::{self, DEFAULT_MAX_LENGTH};
use crate::types::{DocumentMetadata, PipelineError};

/// Runs one full ingestion pass.
///
/// Per-document failures are isolated: a document that cannot be fetched or
/// saved is logged and skipped, and the run continues. Failures in the
/// embedding or index-write stage are batch-wide and abort the run.
pub async fn run_ingest(config: &PipelineConfig) -> Result<(), PipelineError> {
    let client = Client::builder()
        .user_agent(concat!("legisearch/", env!("CARGO_PKG_VERSION")))
        .use_rustls_tls()
        .build()
        .map_err(|err| PipelineError::Config(format!("http client: {err}")))?;

    let store = MetadataStore::connect(&config.postgres).await?;
    store.init_schema().await?;

    let fetcher = LegislationFetcher::for_portal(
        client.clone(),
        config.category.clone(),
        config.start_date,
        config.end_date,
    )?;

    info!(
        category = %config.category,
        start = %config.start_date,
        end = %config.end_date,
        "fetching legislation listing"
    );
    let listing = fetcher.fetch_listing().await;
    info!(count = listing.len(), "listing fetched");

    let mut processed = 0usize;
    let mut skipped = 0usize;
    for entry in &listing {
        match process_document(&fetcher, &store, entry).await {
            Ok(chunk_count) => {
                processed += 1;
                info!(url = %entry.url, chunks = chunk_count, "document processed");
            }
            Err(err) => {
                skipped += 1;
                warn!(url = %entry.url, error = %err, "document skipped");
            }
        }
    }
    info!(processed, skipped, "extraction stage complete");

    embed_and_index(config, &client, &store).await.inspect_err(|err| {
        error!(error = %err, "embedding/indexing stage failed");
    })?;

    store.close().await;
    info!("ingestion complete");
    Ok(())
}

/// Fetch, normalize, chunk, and persist one document. Returns the number of
/// chunks written.
async fn process_document(
    fetcher: &LegislationFetcher,
    store: &MetadataStore,
    entry: &ListingEntry,
) -> Result<usize, PipelineError> {
    let document = fetcher.fetch_document(&entry.url).await?;

    let metadata = DocumentMetadata {
        title: document.title,
        year: document.year,
        number: document.number,
        doc_type: entry.doc_type.clone(),
        date: entry.date.clone(),
        source_url: entry.url.to_string(),
    };

    let cleaned = transform::normalize(&document.text);
    let chunks = transform::chunk(&cleaned, DEFAULT_MAX_LENGTH);

    let document_id = store.save_document(&metadata).await?;
    store.save_chunks(document_id, &chunks).await?;

    Ok(chunks.len())
}

/// Embeds every stored chunk in one batch and rebuilds the collection.
async fn embed_and_index(
    config: &PipelineConfig,
    client: &Client,
    store: &MetadataStore,
) -> Result<(), PipelineError> {
    let chunks = store.load_chunks_for_embedding(None).await?;
    info!(count = chunks.len(), "embedding stored chunks");

    let embedder = HttpEmbedder::new(client.clone(), &config.embedding);
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder.embed_batch(&texts).await?;

    let points: Vec<PointRecord> = chunks
        .iter()
        .zip(vectors)
        .map(|(chunk, vector)| PointRecord {
            id: point_id(chunk.document_id, chunk.chunk_number),
            vector,
            payload: ChunkPayload {
                text: chunk.text.clone(),
                legislation_id: chunk.document_id,
                chunk_number: chunk.chunk_number,
                source_url: chunk.source_url.clone(),
            },
        })
        .collect();

    let index = VectorIndex::new(client.clone(), config.qdrant.base_url());
    index
        .recreate_collection(DEFAULT_COLLECTION, embedder.dimension())
        .await?;
    index.upsert(DEFAULT_COLLECTION, &points).await?;

    Ok(())
}
