//! History-aware retrieval-augmented answer pipeline.
//!
//! 1. Rewrite the question into a standalone query when prior turns exist.
//! 2. Retrieve the top-k chunks for that query.
//! 3. Answer from the retrieved context, the prior turns and the question.

use std::sync::Arc;

use super::store::{DocumentStore, RetrievedChunk};
use crate::core::config::AppConfig;
use crate::core::errors::ApiError;
use crate::history::ChatTurn;
use crate::llm::{ChatMessage, ChatModel, ChatRequest, LlmProvider};

pub const QA_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Use the following context to answer the user's question in detail.";

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub retriever_k: usize,
    pub temperature: f32,
    pub contextualize_prompt: String,
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            retriever_k: config.rag.retriever_k,
            temperature: config.llm.temperature,
            contextualize_prompt: config.rag.contextualize_prompt.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub answer: String,
    /// Query actually sent to retrieval.
    pub standalone_question: String,
    pub sources: Vec<RetrievedChunk>,
}

pub struct RagPipeline {
    llm: Arc<dyn LlmProvider>,
    store: Arc<dyn DocumentStore>,
    settings: PipelineSettings,
}

impl RagPipeline {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn DocumentStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            llm,
            store,
            settings,
        }
    }

    /// Runs all three steps against `model`. Any failing step fails the whole
    /// call with `ApiError::Generation`; nothing partial is returned.
    pub async fn answer(
        &self,
        question: &str,
        history: &[ChatTurn],
        model: ChatModel,
    ) -> Result<RagAnswer, ApiError> {
        let standalone_question = self
            .contextualize(question, history, model)
            .await
            .map_err(|e| step_failure("query rewrite", e))?;

        let sources = self
            .store
            .retrieve(&standalone_question, self.settings.retriever_k)
            .await
            .map_err(|e| step_failure("retrieval", e))?;

        let request = build_answer_request(question, history, &sources)
            .with_temperature(self.settings.temperature);
        let answer = self
            .llm
            .generate(request, model)
            .await
            .map_err(|e| step_failure("generation", e))?;

        Ok(RagAnswer {
            answer,
            standalone_question,
            sources,
        })
    }

    async fn contextualize(
        &self,
        question: &str,
        history: &[ChatTurn],
        model: ChatModel,
    ) -> Result<String, ApiError> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let mut messages = vec![ChatMessage::system(&self.settings.contextualize_prompt)];
        push_turns(&mut messages, history);
        messages.push(ChatMessage::user(question));

        let rewritten = self
            .llm
            .generate(
                ChatRequest::new(messages).with_temperature(self.settings.temperature),
                model,
            )
            .await?;

        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(rewritten.to_string())
        }
    }
}

fn push_turns(messages: &mut Vec<ChatMessage>, history: &[ChatTurn]) {
    for turn in history {
        messages.push(ChatMessage::user(&turn.question));
        messages.push(ChatMessage::assistant(&turn.answer));
    }
}

fn build_answer_request(
    question: &str,
    history: &[ChatTurn],
    sources: &[RetrievedChunk],
) -> ChatRequest {
    let context = sources
        .iter()
        .map(|s| s.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut messages = vec![
        ChatMessage::system(QA_SYSTEM_PROMPT),
        ChatMessage::system(format!("Context: {}", context)),
    ];
    push_turns(&mut messages, history);
    messages.push(ChatMessage::user(question));
    ChatRequest::new(messages)
}

fn step_failure(step: &str, err: ApiError) -> ApiError {
    ApiError::Generation(format!("{} failed: {}", step, err.detail()))
}
