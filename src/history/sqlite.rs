use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::{ChatLogEntry, DocumentRecord, LogStore};
use crate::core::errors::ApiError;
use crate::llm::ChatModel;

#[derive(Clone)]
pub struct SqliteLogStore {
    pool: SqlitePool,
}

impl SqliteLogStore {
    pub async fn new(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to connect to log db: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chat_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                model TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init chat_logs table: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS document_records (
                file_id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                upload_timestamp TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init document_records table: {}", e)))?;

        Ok(Self { pool })
    }

    fn row_to_entry(row: &SqliteRow) -> ChatLogEntry {
        ChatLogEntry {
            id: row.try_get::<i64, _>("id").unwrap_or_default(),
            session_id: row.try_get::<String, _>("session_id").unwrap_or_default(),
            question: row.try_get::<String, _>("question").unwrap_or_default(),
            answer: row.try_get::<String, _>("answer").unwrap_or_default(),
            model_name: row.try_get::<String, _>("model").unwrap_or_default(),
            created_at: row.try_get::<String, _>("created_at").unwrap_or_default(),
        }
    }
}

#[async_trait]
impl LogStore for SqliteLogStore {
    async fn insert_log(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
        model: ChatModel,
    ) -> Result<i64, ApiError> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO chat_logs (session_id, question, answer, model, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(question)
        .bind(answer)
        .bind(model.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get_history(&self, session_id: &str) -> Result<Vec<ChatLogEntry>, ApiError> {
        let rows = sqlx::query(
            "SELECT id, session_id, question, answer, model, created_at
             FROM chat_logs WHERE session_id = ? ORDER BY id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_entry).collect())
    }

    async fn insert_document_record(&self, filename: &str) -> Result<i64, ApiError> {
        let now = chrono::Utc::now().to_rfc3339();

        let result =
            sqlx::query("INSERT INTO document_records (filename, upload_timestamp) VALUES (?, ?)")
                .bind(filename)
                .bind(now)
                .execute(&self.pool)
                .await?;

        Ok(result.last_insert_rowid())
    }

    async fn delete_document_record(&self, file_id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM document_records WHERE file_id = ?")
            .bind(file_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ApiError> {
        let rows = sqlx::query(
            "SELECT file_id, filename, upload_timestamp FROM document_records ORDER BY file_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| DocumentRecord {
                file_id: row.try_get::<i64, _>("file_id").unwrap_or_default(),
                filename: row.try_get::<String, _>("filename").unwrap_or_default(),
                upload_timestamp: row
                    .try_get::<String, _>("upload_timestamp")
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn ensure_indexes(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_logs_session_id ON chat_logs(session_id, id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create index: {}", e)))?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
