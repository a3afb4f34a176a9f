//! Runs one full ingestion pass against the configured portal, store, and
//! index.

use legisearch::pipeline::run_ingest;
use legisearch::{PipelineConfig, PipelineError};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    init_tracing();

    let config = PipelineConfig::from_env()?;
    run_ingest(&config).await
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
