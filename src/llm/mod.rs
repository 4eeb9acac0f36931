pub mod gemini;
pub mod models;
pub mod provider;
pub mod types;

pub use gemini::GeminiProvider;
pub use models::ChatModel;
pub use provider::{Embedder, LlmProvider};
pub use types::{ChatMessage, ChatRequest, Role};
