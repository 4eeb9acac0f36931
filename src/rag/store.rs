//! DocumentStore trait: abstract interface over the chunk index.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A stored document chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub chunk_id: String,
    /// Document record this chunk belongs to.
    pub file_id: i64,
    pub chunk_index: i64,
    pub content: String,
    /// File name the chunk was extracted from.
    pub source: String,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: StoredChunk,
    /// Similarity score (higher = better).
    pub score: f32,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load, split, embed and store the file at `path` under `file_id`.
    ///
    /// Returns the number of chunks written. A file that yields no text is an
    /// error, so a successful call always leaves at least one chunk behind.
    async fn index(&self, path: &Path, file_id: i64) -> Result<usize, ApiError>;

    /// Remove every chunk of `file_id`; errors when there was nothing to remove.
    async fn delete(&self, file_id: i64) -> Result<usize, ApiError>;

    /// Top `k` chunks for `query`, best first.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, ApiError>;

    async fn count(&self) -> Result<usize, ApiError>;

    async fn close(&self) {}
}
