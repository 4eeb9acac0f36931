use serde::{Deserialize, Serialize};

pub const DEFAULT_CONTEXTUALIZE_PROMPT: &str = "Given a chat history and the latest user question \
which might reference context in the chat history, \
formulate a standalone question which can be understood \
without the chat history. Do NOT answer the question, \
just reformulate it if needed and otherwise return it as is.";

/// Typed view of the merged configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub rag: RagSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_allowed_origins: Vec::new(),
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_key: String,
    pub api_base: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub embedding_model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.7,
            request_timeout_secs: 60,
            embedding_model: "text-embedding-004".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub retriever_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub contextualize_prompt: String,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            retriever_k: 5,
            chunk_size: 1000,
            chunk_overlap: 200,
            contextualize_prompt: DEFAULT_CONTEXTUALIZE_PROMPT.to_string(),
        }
    }
}
