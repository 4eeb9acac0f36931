use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    pub file_id: i64,
}

pub async fn upload_doc(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::Validation("No file name provided".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("Failed to read file: {}", e)))?;

        let receipt = state.documents.upload(&filename, &data).await?;
        return Ok(Json(json!({
            "message": receipt.message,
            "file_id": receipt.file_id
        })));
    }

    Err(ApiError::Validation("Missing 'file' field".to_string()))
}

pub async fn list_docs(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let documents = state.documents.list().await?;
    Ok(Json(documents))
}

/// Always 200; failures are reported in the body.
pub async fn delete_doc(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DeleteFileRequest>,
) -> impl IntoResponse {
    let outcome = state.documents.delete(payload.file_id).await;
    Json(outcome.to_body())
}
