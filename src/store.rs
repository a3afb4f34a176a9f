//! PostgreSQL persistence for documents and chunks.
//!
//! Uniqueness constraints on `source_url` and `(legislation_id,
//! chunk_number)` make every save an idempotent upsert; re-running the
//! pipeline updates rows in place instead of duplicating them.

use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::config::PostgresConfig;
use crate::transform::Chunk;
use crate::types::{DocumentMetadata, PipelineError};

/// A chunk row joined with its owning document's metadata, ready for the
/// embedding stage. Denormalized so retrieval payloads need no second
/// lookup.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub id: i64,
    pub document_id: i64,
    pub chunk_number: i32,
    pub text: String,
    pub title: String,
    pub year: String,
    pub number: String,
    pub source_url: String,
}

/// Connection-pool wrapper owning the document and chunk tables.
pub struct MetadataStore {
    pool: PgPool,
}

impl MetadataStore {
    /// Connects to PostgreSQL. The pool is released by [`close`](Self::close)
    /// or on drop, including error paths.
    #[instrument(skip(config))]
    pub async fn connect(config: &PostgresConfig) -> Result<Self, PipelineError> {
        let pool = PgPool::connect(&config.database_url())
            .await
            .map_err(|e| PipelineError::Store(format!("connect: {e}")))?;
        Ok(Self { pool })
    }

    /// Creates the schema when absent. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn init_schema(&self) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS legislation (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL DEFAULT '',
                year TEXT NOT NULL DEFAULT '',
                number TEXT NOT NULL DEFAULT '',
                type TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL DEFAULT '',
                source_url TEXT NOT NULL UNIQUE,
                processed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Store(format!("create legislation: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS legislation_chunks (
                id BIGSERIAL PRIMARY KEY,
                legislation_id BIGINT NOT NULL REFERENCES legislation(id),
                chunk_number INTEGER NOT NULL,
                text TEXT NOT NULL,
                processed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                UNIQUE (legislation_id, chunk_number)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Store(format!("create legislation_chunks: {e}")))?;

        Ok(())
    }

    /// Upserts one document's metadata, keyed by `source_url`, and returns
    /// its row id. Re-saving the same URL updates the metadata and refreshes
    /// the processing timestamp.
    #[instrument(skip(self, doc), fields(source_url = %doc.source_url), err)]
    pub async fn save_document(&self, doc: &DocumentMetadata) -> Result<i64, PipelineError> {
        sqlx::query_scalar(
            r#"
            INSERT INTO legislation (title, year, number, type, date, source_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_url) DO UPDATE SET
                title = EXCLUDED.title,
                year = EXCLUDED.year,
                number = EXCLUDED.number,
                type = EXCLUDED.type,
                date = EXCLUDED.date,
                processed_at = NOW()
            RETURNING id
            "#,
        )
        .bind(&doc.title)
        .bind(&doc.year)
        .bind(&doc.number)
        .bind(&doc.doc_type)
        .bind(&doc.date)
        .bind(&doc.source_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::Store(format!("save document: {e}")))
    }

    /// Upserts a document's chunks in one transaction, keyed by
    /// `(legislation_id, chunk_number)`. Re-saving a key overwrites the text
    /// and refreshes the timestamp.
    #[instrument(skip(self, chunks), fields(count = chunks.len()), err)]
    pub async fn save_chunks(
        &self,
        document_id: i64,
        chunks: &[Chunk],
    ) -> Result<(), PipelineError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PipelineError::Store(format!("tx begin: {e}")))?;

        for chunk in chunks {
            sqlx::query(
                r#"
                INSERT INTO legislation_chunks (legislation_id, chunk_number, text)
                VALUES ($1, $2, $3)
                ON CONFLICT (legislation_id, chunk_number) DO UPDATE SET
                    text = EXCLUDED.text,
                    processed_at = NOW()
                "#,
            )
            .bind(document_id)
            .bind(chunk.chunk_number as i32)
            .bind(&chunk.text)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                PipelineError::Store(format!("save chunk {}: {e}", chunk.chunk_number))
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| PipelineError::Store(format!("tx commit: {e}")))?;

        Ok(())
    }

    /// Reads every stored chunk joined with its document's metadata, in
    /// `(document, chunk_number)` order.
    #[instrument(skip(self), err)]
    pub async fn load_chunks_for_embedding(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<StoredChunk>, PipelineError> {
        let mut sql = String::from(
            r#"
            SELECT c.id, c.legislation_id, c.chunk_number, c.text,
                   l.title, l.year, l.number, l.source_url
            FROM legislation_chunks c
            JOIN legislation l ON c.legislation_id = l.id
            ORDER BY c.legislation_id, c.chunk_number
            "#,
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::Store(format!("load chunks: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|row| StoredChunk {
                id: row.get("id"),
                document_id: row.get("legislation_id"),
                chunk_number: row.get("chunk_number"),
                text: row.get("text"),
                title: row.get("title"),
                year: row.get("year"),
                number: row.get("number"),
                source_url: row.get("source_url"),
            })
            .collect())
    }

    /// Closes the pool, waiting for in-flight connections to wind down.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
