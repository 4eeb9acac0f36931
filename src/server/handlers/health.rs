use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let documents = match state.logs.list_documents().await {
        Ok(records) => Some(records.len()),
        Err(err) => {
            tracing::warn!("Health check could not list documents: {}", err.detail());
            None
        }
    };

    Json(json!({
        "status": if documents.is_some() { "ok" } else { "degraded" },
        "documents": documents
    }))
}
