use std::sync::Arc;

use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::core::outcome::Outcome;
use crate::history::{ChatTurn, LogStore};
use crate::llm::ChatModel;
use crate::rag::RagPipeline;

#[derive(Debug, Clone)]
pub struct ChatQuery {
    pub question: String,
    pub session_id: Option<String>,
    pub model: ChatModel,
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub answer: String,
    pub session_id: String,
    /// Model that produced the answer.
    pub model: ChatModel,
    /// Number of prior turns fed to the pipeline.
    pub history: Outcome<usize>,
    pub persisted: Outcome<()>,
}

#[derive(Clone)]
pub struct ChatService {
    pipeline: Arc<RagPipeline>,
    logs: Arc<dyn LogStore>,
}

impl ChatService {
    pub fn new(pipeline: Arc<RagPipeline>, logs: Arc<dyn LogStore>) -> Self {
        Self { pipeline, logs }
    }

    pub async fn chat(&self, query: ChatQuery) -> Result<ChatReply, ApiError> {
        let session_id = resolve_session_id(query.session_id.as_deref());
        tracing::info!(
            session_id = %session_id,
            model = %query.model,
            "Chat question: {}",
            query.question
        );

        let history = Outcome::or_degrade(
            self.logs
                .get_history(&session_id)
                .await
                .map(|entries| entries.into_iter().map(ChatTurn::from).collect::<Vec<_>>()),
            Vec::new(),
        );
        if let Some(reason) = history.reason() {
            tracing::error!(
                session_id = %session_id,
                "History fetch failed, continuing without history: {}",
                reason
            );
        }
        let history_outcome = match &history {
            Outcome::Complete(turns) => Outcome::Complete(turns.len()),
            Outcome::Degraded { value, reason } => Outcome::Degraded {
                value: value.len(),
                reason: reason.clone(),
            },
        };
        let turns = history.into_value();

        if !query.model.is_served() {
            tracing::warn!(
                "Model {} is not supported, using {}",
                query.model,
                query.model.served_as()
            );
        }

        let (answer, model) = self.answer_with_fallback(&query.question, &turns, query.model).await?;
        tracing::debug!(session_id = %session_id, "Answer: {}", answer);

        let persisted = Outcome::or_degrade(
            self.logs
                .insert_log(&session_id, &query.question, &answer, model)
                .await
                .map(|_| ()),
            (),
        );
        if let Some(reason) = persisted.reason() {
            tracing::error!(session_id = %session_id, "Failed to persist chat log: {}", reason);
        }

        tracing::info!(session_id = %session_id, model = %model, "Chat answered");
        Ok(ChatReply {
            answer,
            session_id,
            model,
            history: history_outcome,
            persisted,
        })
    }

    async fn answer_with_fallback(
        &self,
        question: &str,
        turns: &[ChatTurn],
        requested: ChatModel,
    ) -> Result<(String, ChatModel), ApiError> {
        let mut last_error = None;

        for candidate in requested.fallback_chain() {
            match self.pipeline.answer(question, turns, candidate).await {
                Ok(result) => return Ok((result.answer, candidate)),
                Err(err) => {
                    tracing::warn!("Model {} failed: {}", candidate, err.detail());
                    last_error = Some(err);
                }
            }
        }

        let detail = last_error
            .map(|err| err.detail().to_string())
            .unwrap_or_else(|| "no model candidates".to_string());
        tracing::error!("All model candidates failed: {}", detail);
        Err(ApiError::Generation(format!("RAG invocation failed: {}", detail)))
    }
}

fn resolve_session_id(requested: Option<&str>) -> String {
    match requested.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}
