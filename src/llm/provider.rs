use async_trait::async_trait;

use super::models::ChatModel;
use super::types::ChatRequest;
use crate::core::errors::ApiError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "gemini")
    fn name(&self) -> &str;

    /// chat completion (non-streaming); errors on transport failures and empty replies
    async fn generate(&self, request: ChatRequest, model: ChatModel) -> Result<String, ApiError>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// one vector per input, in input order
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}
