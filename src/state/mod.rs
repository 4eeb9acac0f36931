use std::sync::Arc;

use crate::core::config::{AppConfig, AppPaths};
use crate::history::{LogStore, SqliteLogStore};
use crate::llm::{Embedder, GeminiProvider, LlmProvider};
use crate::rag::{DocumentStore, PipelineSettings, RagPipeline, SqliteDocumentStore, TextSplitter};
use crate::services::{ChatService, DocumentService};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Built once at start-up and closed by [`AppState::shutdown`] after the
/// server stops accepting requests.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: Arc<AppConfig>,
    pub logs: Arc<dyn LogStore>,
    pub document_store: Arc<dyn DocumentStore>,
    pub chat: ChatService,
    pub documents: DocumentService,
}

impl AppState {
    /// Opens both databases and the Gemini client.
    pub async fn initialize(
        paths: Arc<AppPaths>,
        config: AppConfig,
    ) -> Result<Arc<Self>, InitializationError> {
        let logs: Arc<dyn LogStore> = Arc::new(
            SqliteLogStore::new(paths.db_path.clone())
                .await
                .map_err(|e| InitializationError::LogStore(e.into()))?,
        );

        let gemini =
            Arc::new(GeminiProvider::new(&config.llm).map_err(|e| InitializationError::Llm(e.into()))?);
        let embedder: Arc<dyn Embedder> = gemini.clone();
        let llm: Arc<dyn LlmProvider> = gemini;
        tracing::info!("Using {} for generation and embeddings", llm.name());

        let splitter = TextSplitter::new(config.rag.chunk_size, config.rag.chunk_overlap);
        let document_store: Arc<dyn DocumentStore> = Arc::new(
            SqliteDocumentStore::with_path(paths.chunk_db_path.clone(), embedder, splitter)
                .await
                .map_err(|e| InitializationError::DocumentStore(e.into()))?,
        );

        Ok(Arc::new(Self::from_parts(
            paths,
            config,
            llm,
            document_store,
            logs,
        )))
    }

    /// Wires services over already-built collaborators.
    pub fn from_parts(
        paths: Arc<AppPaths>,
        config: AppConfig,
        llm: Arc<dyn LlmProvider>,
        document_store: Arc<dyn DocumentStore>,
        logs: Arc<dyn LogStore>,
    ) -> Self {
        let pipeline = RagPipeline::new(llm, document_store.clone(), PipelineSettings::from(&config));
        let chat = ChatService::new(Arc::new(pipeline), logs.clone());
        let documents =
            DocumentService::new(document_store.clone(), logs.clone(), paths.upload_dir.clone());

        Self {
            paths,
            config: Arc::new(config),
            logs,
            document_store,
            chat,
            documents,
        }
    }

    pub async fn shutdown(&self) {
        self.document_store.close().await;
        self.logs.close().await;
        tracing::info!("Stores closed");
    }
}
