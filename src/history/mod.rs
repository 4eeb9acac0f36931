//! Relational log store: chat turns per session and uploaded document records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::llm::ChatModel;

mod sqlite;

pub use sqlite::SqliteLogStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLogEntry {
    pub id: i64,
    pub session_id: String,
    pub question: String,
    pub answer: String,
    pub model_name: String,
    pub created_at: String,
}

/// A prior question/answer pair as the pipeline sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

impl From<ChatLogEntry> for ChatTurn {
    fn from(entry: ChatLogEntry) -> Self {
        Self {
            question: entry.question,
            answer: entry.answer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub file_id: i64,
    pub filename: String,
    pub upload_timestamp: String,
}

#[async_trait]
pub trait LogStore: Send + Sync {
    /// Append one chat turn; returns the row id.
    async fn insert_log(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
        model: ChatModel,
    ) -> Result<i64, ApiError>;

    /// All turns of a session, oldest first.
    async fn get_history(&self, session_id: &str) -> Result<Vec<ChatLogEntry>, ApiError>;

    /// Create a document record and return its file id.
    async fn insert_document_record(&self, filename: &str) -> Result<i64, ApiError>;

    /// Returns false when no record had this id.
    async fn delete_document_record(&self, file_id: i64) -> Result<bool, ApiError>;

    /// All document records in upload order.
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ApiError>;

    /// Secondary indexes; safe to call repeatedly.
    async fn ensure_indexes(&self) -> Result<(), ApiError>;

    async fn close(&self) {}
}
