use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::history::{DocumentRecord, LogStore};
use crate::rag::loader::{DocumentKind, ALLOWED_EXTENSIONS};
use crate::rag::DocumentStore;

#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub file_id: i64,
    pub message: String,
}

/// Result of a delete request. Failures are reported in-band.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted { file_id: i64 },
    /// Chunks could not be removed; the record was left untouched.
    StoreFailed { file_id: i64 },
    /// Chunks are gone but the record is still listed and needs manual cleanup.
    RecordFailed { file_id: i64 },
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted { .. })
    }

    pub fn to_body(&self) -> Value {
        match self {
            DeleteOutcome::Deleted { file_id } => json!({
                "message": format!(
                    "Successfully deleted document with file_id {} from the system.",
                    file_id
                )
            }),
            DeleteOutcome::StoreFailed { file_id } => json!({
                "error": format!(
                    "Failed to delete document with file_id {} from the document store.",
                    file_id
                )
            }),
            DeleteOutcome::RecordFailed { file_id } => json!({
                "error": format!(
                    "Deleted document chunks for file_id {} but failed to delete the document record.",
                    file_id
                )
            }),
        }
    }
}

#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    logs: Arc<dyn LogStore>,
    upload_dir: PathBuf,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>, logs: Arc<dyn LogStore>, upload_dir: PathBuf) -> Self {
        Self {
            store,
            logs,
            upload_dir,
        }
    }

    /// Stores and indexes an uploaded file.
    ///
    /// The bytes live in a temporary file for the duration of the call only;
    /// it is removed when the handle drops, whichever way this returns.
    pub async fn upload(&self, filename: &str, data: &[u8]) -> Result<UploadReceipt, ApiError> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(ApiError::Validation("No file name provided".to_string()));
        }

        let kind = DocumentKind::from_filename(filename).ok_or_else(|| {
            ApiError::Validation(format!(
                "Unsupported file type. Allowed types are: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;

        let mut temp = tempfile::Builder::new()
            .prefix("temp_")
            .suffix(kind.extension())
            .tempfile_in(&self.upload_dir)
            .map_err(|e| ApiError::internal(format!("Failed to create upload file: {}", e)))?;
        temp.write_all(data)
            .and_then(|_| temp.flush())
            .map_err(|e| ApiError::internal(format!("Failed to write upload file: {}", e)))?;

        let file_id = self.logs.insert_document_record(filename).await?;

        match self.store.index(temp.path(), file_id).await {
            Ok(chunks) => {
                tracing::info!(file_id, chunks, "Indexed {}", filename);
                Ok(UploadReceipt {
                    file_id,
                    message: format!(
                        "File {} has been successfully uploaded and indexed.",
                        filename
                    ),
                })
            }
            Err(err) => {
                tracing::error!(file_id, "Indexing {} failed: {}", filename, err.detail());
                match self.logs.delete_document_record(file_id).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::warn!(file_id, "Document record already gone during rollback")
                    }
                    Err(e) => tracing::error!(
                        file_id,
                        "Failed to roll back document record: {}",
                        e.detail()
                    ),
                }
                Err(ApiError::Indexing(format!("Failed to index {}.", filename)))
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<DocumentRecord>, ApiError> {
        self.logs.list_documents().await
    }

    /// Removes chunks first and the record only after that succeeded.
    pub async fn delete(&self, file_id: i64) -> DeleteOutcome {
        if let Err(err) = self.store.delete(file_id).await {
            tracing::error!(file_id, "Failed to delete chunks: {}", err.detail());
            return DeleteOutcome::StoreFailed { file_id };
        }

        match self.logs.delete_document_record(file_id).await {
            Ok(true) => {
                tracing::info!(file_id, "Deleted document");
                DeleteOutcome::Deleted { file_id }
            }
            Ok(false) => {
                tracing::error!(file_id, "Chunks deleted but no document record found");
                DeleteOutcome::RecordFailed { file_id }
            }
            Err(err) => {
                tracing::error!(
                    file_id,
                    "Chunks deleted but record removal failed: {}",
                    err.detail()
                );
                DeleteOutcome::RecordFailed { file_id }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ChatLogEntry;
    use crate::llm::ChatModel;
    use crate::rag::RetrievedChunk;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordLogs {
        records: Mutex<BTreeMap<i64, String>>,
        next_id: Mutex<i64>,
    }

    #[async_trait]
    impl LogStore for RecordLogs {
        async fn insert_log(
            &self,
            _session_id: &str,
            _question: &str,
            _answer: &str,
            _model: ChatModel,
        ) -> Result<i64, ApiError> {
            Ok(1)
        }

        async fn get_history(&self, _session_id: &str) -> Result<Vec<ChatLogEntry>, ApiError> {
            Ok(Vec::new())
        }

        async fn insert_document_record(&self, filename: &str) -> Result<i64, ApiError> {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            self.records.lock().unwrap().insert(*next, filename.to_string());
            Ok(*next)
        }

        async fn delete_document_record(&self, file_id: i64) -> Result<bool, ApiError> {
            Ok(self.records.lock().unwrap().remove(&file_id).is_some())
        }

        async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ApiError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .map(|(id, name)| DocumentRecord {
                    file_id: *id,
                    filename: name.clone(),
                    upload_timestamp: String::new(),
                })
                .collect())
        }

        async fn ensure_indexes(&self) -> Result<(), ApiError> {
            Ok(())
        }
    }

    /// Indexes any file whose contents are not "broken"; remembers seen paths.
    #[derive(Default)]
    struct RecordingStore {
        indexed: Mutex<BTreeMap<i64, usize>>,
        seen_paths: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl DocumentStore for RecordingStore {
        async fn index(&self, path: &Path, file_id: i64) -> Result<usize, ApiError> {
            self.seen_paths.lock().unwrap().push(path.to_path_buf());
            let contents = std::fs::read_to_string(path).map_err(ApiError::internal)?;
            if contents == "broken" {
                return Err(ApiError::Indexing("no text".to_string()));
            }
            self.indexed.lock().unwrap().insert(file_id, 1);
            Ok(1)
        }

        async fn delete(&self, file_id: i64) -> Result<usize, ApiError> {
            self.indexed
                .lock()
                .unwrap()
                .remove(&file_id)
                .ok_or_else(|| ApiError::internal("nothing indexed"))
        }

        async fn retrieve(&self, _query: &str, _k: usize) -> Result<Vec<RetrievedChunk>, ApiError> {
            Ok(Vec::new())
        }

        async fn count(&self) -> Result<usize, ApiError> {
            Ok(self.indexed.lock().unwrap().len())
        }
    }

    struct Fixture {
        service: DocumentService,
        store: Arc<RecordingStore>,
        logs: Arc<RecordLogs>,
        dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RecordingStore::default());
        let logs = Arc::new(RecordLogs::default());
        let service = DocumentService::new(store.clone(), logs.clone(), dir.path().to_path_buf());
        Fixture {
            service,
            store,
            logs,
            dir,
        }
    }

    fn dir_is_empty(path: &Path) -> bool {
        std::fs::read_dir(path).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn upload_indexes_and_removes_temp_file() {
        let f = fixture();

        let receipt = f.service.upload("Policy.HTML", b"<p>hello</p>").await.unwrap();

        assert_eq!(receipt.file_id, 1);
        assert_eq!(
            receipt.message,
            "File Policy.HTML has been successfully uploaded and indexed."
        );
        let seen = f.store.seen_paths.lock().unwrap();
        let name = seen[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("temp_"));
        assert!(name.ends_with(".html"));
        assert!(!seen[0].exists());
        assert!(dir_is_empty(f.dir.path()));
        assert_eq!(f.service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected_before_anything_is_stored() {
        let f = fixture();

        let err = f.service.upload("notes.txt", b"plain").await.unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(
            err.detail(),
            "Unsupported file type. Allowed types are: .pdf, .docx, .html"
        );
        assert!(f.logs.records.lock().unwrap().is_empty());
        assert!(dir_is_empty(f.dir.path()));
    }

    #[tokio::test]
    async fn indexing_failure_rolls_back_record() {
        let f = fixture();

        let err = f.service.upload("bad.pdf", b"broken").await.unwrap_err();

        assert!(matches!(err, ApiError::Indexing(_)));
        assert_eq!(err.detail(), "Failed to index bad.pdf.");
        assert!(f.service.list().await.unwrap().is_empty());
        assert!(dir_is_empty(f.dir.path()));
    }

    #[tokio::test]
    async fn delete_removes_chunks_then_record() {
        let f = fixture();
        let receipt = f.service.upload("a.docx", b"text").await.unwrap();

        let outcome = f.service.delete(receipt.file_id).await;

        assert!(outcome.is_deleted());
        assert_eq!(
            outcome.to_body()["message"],
            format!(
                "Successfully deleted document with file_id {} from the system.",
                receipt.file_id
            )
        );
        assert!(f.service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_to_store_leaves_record() {
        let f = fixture();
        let file_id = f.logs.insert_document_record("orphan.pdf").await.unwrap();

        let outcome = f.service.delete(file_id).await;

        assert_eq!(outcome, DeleteOutcome::StoreFailed { file_id });
        assert!(outcome.to_body().get("error").is_some());
        assert_eq!(f.service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_without_record_reports_record_failure() {
        let f = fixture();
        f.store.indexed.lock().unwrap().insert(42, 3);

        let outcome = f.service.delete(42).await;

        assert_eq!(outcome, DeleteOutcome::RecordFailed { file_id: 42 });
        assert_eq!(f.store.count().await.unwrap(), 0);
    }
}
