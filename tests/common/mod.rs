#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use docqa_backend::core::config::{AppConfig, AppPaths};
use docqa_backend::core::errors::ApiError;
use docqa_backend::history::{ChatLogEntry, DocumentRecord, LogStore};
use docqa_backend::llm::{ChatModel, ChatRequest, LlmProvider};
use docqa_backend::rag::{DocumentStore, RetrievedChunk, StoredChunk};
use docqa_backend::server::router::router;
use docqa_backend::state::AppState;

#[derive(Default)]
pub struct MemoryLogStore {
    pub logs: Mutex<Vec<ChatLogEntry>>,
    pub records: Mutex<BTreeMap<i64, String>>,
    pub next_file_id: Mutex<i64>,
    pub fail_history: bool,
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn insert_log(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
        model: ChatModel,
    ) -> Result<i64, ApiError> {
        let mut logs = self.logs.lock().unwrap();
        let id = logs.len() as i64 + 1;
        logs.push(ChatLogEntry {
            id,
            session_id: session_id.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            model_name: model.to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        });
        Ok(id)
    }

    async fn get_history(&self, session_id: &str) -> Result<Vec<ChatLogEntry>, ApiError> {
        if self.fail_history {
            return Err(ApiError::internal("history unavailable"));
        }
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn insert_document_record(&self, filename: &str) -> Result<i64, ApiError> {
        let mut next = self.next_file_id.lock().unwrap();
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
            .map(|(file_id, filename)| DocumentRecord {
                file_id: *file_id,
                filename: filename.clone(),
                upload_timestamp: "2024-01-01T00:00:00Z".to_string(),
            })
            .collect())
    }

    async fn ensure_indexes(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Keeps each file's raw text as a single chunk. Empty files fail to index.
#[derive(Default)]
pub struct MemoryDocumentStore {
    pub chunks: Mutex<BTreeMap<i64, String>>,
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn index(&self, path: &Path, file_id: i64) -> Result<usize, ApiError> {
        let text = std::fs::read_to_string(path).map_err(ApiError::internal)?;
        if text.trim().is_empty() {
            return Err(ApiError::Indexing("No text extracted".to_string()));
        }
        self.chunks.lock().unwrap().insert(file_id, text);
        Ok(1)
    }

    async fn delete(&self, file_id: i64) -> Result<usize, ApiError> {
        self.chunks
            .lock()
            .unwrap()
            .remove(&file_id)
            .map(|_| 1)
            .ok_or_else(|| ApiError::internal(format!("No chunks indexed for file_id {}", file_id)))
    }

    async fn retrieve(&self, _query: &str, k: usize) -> Result<Vec<RetrievedChunk>, ApiError> {
        Ok(self
            .chunks
            .lock()
            .unwrap()
            .iter()
            .take(k)
            .map(|(file_id, text)| RetrievedChunk {
                chunk: StoredChunk {
                    chunk_id: format!("{}-0", file_id),
                    file_id: *file_id,
                    chunk_index: 0,
                    content: text.clone(),
                    source: format!("{}.html", file_id),
                },
                score: 1.0,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, ApiError> {
        Ok(self.chunks.lock().unwrap().len())
    }
}

/// Answers with the last user message; fails the first `failures` calls.
#[derive(Default)]
pub struct EchoLlm {
    pub failures: Mutex<usize>,
    pub requests: Mutex<Vec<(ChatModel, ChatRequest)>>,
}

impl EchoLlm {
    pub fn failing(failures: usize) -> Self {
        Self {
            failures: Mutex::new(failures),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmProvider for EchoLlm {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, request: ChatRequest, model: ChatModel) -> Result<String, ApiError> {
        let last = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.requests.lock().unwrap().push((model, request));

        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(ApiError::Generation("503 from upstream".to_string()));
        }
        Ok(format!("echo: {}", last))
    }
}

pub struct TestApp {
    pub router: Router,
    pub logs: Arc<MemoryLogStore>,
    pub store: Arc<MemoryDocumentStore>,
    pub llm: Arc<EchoLlm>,
    pub data_dir: tempfile::TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_parts(MemoryLogStore::default(), EchoLlm::default())
    }

    pub fn with_parts(logs: MemoryLogStore, llm: EchoLlm) -> Self {
        let data_dir = tempfile::tempdir().unwrap();
        let paths = Arc::new(AppPaths::at(data_dir.path()));
        let logs = Arc::new(logs);
        let store = Arc::new(MemoryDocumentStore::default());
        let llm = Arc::new(llm);

        let state = AppState::from_parts(
            paths,
            AppConfig::default(),
            llm.clone(),
            store.clone(),
            logs.clone(),
        );

        Self {
            router: router(Arc::new(state)),
            logs,
            store,
            llm,
            data_dir,
        }
    }

    pub fn upload_dir_is_empty(&self) -> bool {
        std::fs::read_dir(self.data_dir.path().join("documents"))
            .unwrap()
            .next()
            .is_none()
    }
}

pub const BOUNDARY: &str = "docqa-test-boundary";

pub fn multipart_body(field: &str, filename: &str, contents: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}
