use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::llm::ChatModel;
use crate::services::ChatQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryInput {
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub model: ChatModel,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub session_id: String,
    pub model: ChatModel,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let reply = state
        .chat
        .chat(ChatQuery {
            question: payload.question,
            session_id: payload.session_id,
            model: payload.model,
        })
        .await?;

    Ok(Json(QueryResponse {
        answer: reply.answer,
        session_id: reply.session_id,
        model: reply.model,
    }))
}
