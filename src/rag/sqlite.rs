//! SQLite-backed document store.
//!
//! Chunks and their embeddings live in one table; search is brute-force
//! cosine similarity over every stored vector.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::loader;
use super::splitter::TextSplitter;
use super::store::{DocumentStore, RetrievedChunk, StoredChunk};
use crate::core::errors::ApiError;
use crate::llm::Embedder;

/// Inputs per embedding request.
const EMBED_BATCH_SIZE: usize = 100;

pub struct SqliteDocumentStore {
    pool: SqlitePool,
    embedder: Arc<dyn Embedder>,
    splitter: TextSplitter,
}

impl SqliteDocumentStore {
    pub async fn with_path(
        db_path: PathBuf,
        embedder: Arc<dyn Embedder>,
        splitter: TextSplitter,
    ) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self {
            pool,
            embedder,
            splitter,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS doc_chunks (
                chunk_id TEXT PRIMARY KEY,
                file_id INTEGER NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_doc_chunks_file ON doc_chunks(file_id)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> StoredChunk {
        StoredChunk {
            chunk_id: row.get("chunk_id"),
            file_id: row.get("file_id"),
            chunk_index: row.get("chunk_index"),
            content: row.get("content"),
            source: row.get("source"),
        }
    }

    async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            vectors.extend(self.embedder.embed(batch).await?);
        }
        Ok(vectors)
    }

    async fn insert_chunks(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (chunk, embedding) in &items {
            sqlx::query(
                "INSERT OR REPLACE INTO doc_chunks (chunk_id, file_id, chunk_index, content, source, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&chunk.chunk_id)
            .bind(chunk.file_id)
            .bind(chunk.chunk_index)
            .bind(&chunk.content)
            .bind(&chunk.source)
            .bind(Self::serialize_embedding(embedding))
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn index(&self, path: &Path, file_id: i64) -> Result<usize, ApiError> {
        let owned_path = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || loader::load_text(&owned_path))
            .await
            .map_err(ApiError::internal)??;

        let pieces = self.splitter.split(&text);
        if pieces.is_empty() {
            return Err(ApiError::Indexing(format!(
                "No text could be extracted from {}",
                path.display()
            )));
        }

        let contents: Vec<String> = pieces.iter().map(|p| p.text.clone()).collect();
        let embeddings = self.embed_all(&contents).await?;
        if embeddings.len() != pieces.len() {
            return Err(ApiError::Indexing(format!(
                "Expected {} embeddings, got {}",
                pieces.len(),
                embeddings.len()
            )));
        }

        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let items: Vec<(StoredChunk, Vec<f32>)> = pieces
            .into_iter()
            .zip(embeddings)
            .map(|(piece, embedding)| {
                let chunk = StoredChunk {
                    chunk_id: format!("{}-{}", file_id, piece.chunk_index),
                    file_id,
                    chunk_index: piece.chunk_index as i64,
                    content: piece.text,
                    source: source.clone(),
                };
                (chunk, embedding)
            })
            .collect();

        let count = items.len();
        self.insert_chunks(items).await?;
        tracing::info!("Indexed {} chunks for file_id {}", count, file_id);
        Ok(count)
    }

    async fn delete(&self, file_id: i64) -> Result<usize, ApiError> {
        let result = sqlx::query("DELETE FROM doc_chunks WHERE file_id = ?1")
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        let deleted = result.rows_affected() as usize;
        if deleted == 0 {
            return Err(ApiError::Internal(format!(
                "No chunks indexed for file_id {}",
                file_id
            )));
        }
        tracing::info!("Deleted {} chunks for file_id {}", deleted, file_id);
        Ok(deleted)
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, ApiError> {
        let query_embedding = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::internal("Embedder returned no vector for query"))?;

        let rows = sqlx::query(
            "SELECT chunk_id, file_id, chunk_index, content, source, embedding FROM doc_chunks",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut scored: Vec<RetrievedChunk> = rows
            .iter()
            .map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                let stored = Self::deserialize_embedding(&embedding_bytes);
                RetrievedChunk {
                    chunk: Self::row_to_chunk(row),
                    score: Self::cosine_similarity(&query_embedding, &stored),
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k.max(1));

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM doc_chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
