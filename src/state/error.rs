use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to open log store: {0}")]
    LogStore(#[source] anyhow::Error),

    #[error("Failed to open document store: {0}")]
    DocumentStore(#[source] anyhow::Error),

    #[error("Failed to create LLM client: {0}")]
    Llm(#[source] anyhow::Error),
}
