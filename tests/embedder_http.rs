//! HTTP embedder tests against a mocked inference endpoint.

use httpmock::prelude::*;
use legisearch::config::EmbeddingConfig;
use legisearch::embed::{Embedder, HttpEmbedder};
use legisearch::types::PipelineError;
use serde_json::json;

fn embedder_for(server: &MockServer) -> HttpEmbedder {
    let config = EmbeddingConfig {
        endpoint: server.url("/embed"),
        model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
        dimension: 3,
    };
    HttpEmbedder::new(reqwest::Client::new(), &config)
}

#[tokio::test]
async fn vectors_come_back_in_input_order() {
    let server = MockServer::start_async().await;

    // Respond with the indexed form, deliberately out of order.
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/embed")
                .json_body_partial(r#"{"model": "sentence-transformers/all-MiniLM-L6-v2"}"#);
            then.status(200).json_body(json!({
                "data": [
                    {"embedding": [0.4, 0.5, 0.6], "index": 1},
                    {"embedding": [0.1, 0.2, 0.3], "index": 0}
                ]
            }));
        })
        .await;

    let embedder = embedder_for(&server);
    let texts = vec!["first chunk".to_string(), "second chunk".to_string()];
    let vectors = embedder.embed_batch(&texts).await.unwrap();

    mock.assert_async().await;
    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0], vec![0.1, 0.2, 0.3]);
    assert_eq!(vectors[1], vec![0.4, 0.5, 0.6]);
}

#[tokio::test]
async fn bare_embeddings_form_is_accepted() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200)
                .json_body(json!({"embeddings": [[1.0, 0.0, 0.0]]}));
        })
        .await;

    let embedder = embedder_for(&server);
    let vectors = embedder
        .embed_batch(&["only text".to_string()])
        .await
        .unwrap();
    assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0]]);
}

#[tokio::test]
async fn count_mismatch_is_an_error_not_partial_output() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200)
                .json_body(json!({"embeddings": [[1.0, 0.0, 0.0]]}));
        })
        .await;

    let embedder = embedder_for(&server);
    let texts = vec!["one".to_string(), "two".to_string()];
    let err = embedder.embed_batch(&texts).await.unwrap_err();
    assert!(matches!(err, PipelineError::Embedding(_)));
}

#[tokio::test]
async fn endpoint_failure_surfaces_as_embedding_error() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(503).body("model loading");
        })
        .await;

    let embedder = embedder_for(&server);
    let err = embedder
        .embed_batch(&["text".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Embedding(_)));
}

#[tokio::test]
async fn empty_batch_makes_no_request() {
    let server = MockServer::start_async().await;
    // No mock registered: any request would fail the call.
    let embedder = embedder_for(&server);
    let vectors = embedder.embed_batch(&[]).await.unwrap();
    assert!(vectors.is_empty());
}
