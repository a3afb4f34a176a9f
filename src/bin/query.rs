//! Free-text semantic query against the legislation collection.
//!
//! ```bash
//! query "permitted development rights"
//! ```

use std::sync::Arc;

use legisearch::config::DEFAULT_COLLECTION;
use legisearch::embed::HttpEmbedder;
use legisearch::index::VectorIndex;
use legisearch::query::{DEFAULT_TOP_K, QueryService};
use legisearch::{PipelineConfig, PipelineError};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    init_tracing();

    let query_text = std::env::args().nth(1).ok_or_else(|| {
        PipelineError::Config("usage: query <free-text query>".to_string())
    })?;

    let config = PipelineConfig::from_env()?;
    let client = reqwest::Client::builder()
        .use_rustls_tls()
        .build()
        .map_err(|err| PipelineError::Config(format!("http client: {err}")))?;

    let embedder = Arc::new(HttpEmbedder::new(client.clone(), &config.embedding));
    let index = VectorIndex::new(client, config.qdrant.base_url());
    let service = QueryService::new(embedder, index, DEFAULT_COLLECTION);

    let results = service.query(&query_text, DEFAULT_TOP_K).await?;

    for (rank, result) in results.iter().enumerate() {
        println!("\nResult {} (Score: {:.4}):", rank + 1, result.score);
        println!("Source: {}", result.source_url);
        println!("Chunk #{}", result.chunk_number);
        println!("{}", "=".repeat(50));
        println!("{}", result.text);
        println!("{}", "=".repeat(50));
    }

    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
