//! Google Generative Language API client for answer generation and embeddings.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::models::ChatModel;
use super::provider::{Embedder, LlmProvider};
use super::types::{ChatRequest, Role};
use crate::core::config::LlmSettings;
use crate::core::errors::ApiError;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    embedding_model: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(settings: &LlmSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: settings.api_base.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            embedding_model: settings.embedding_model.clone(),
            client,
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    content: Content,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<Embedding>,
}

#[derive(Debug, Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

fn text_content(role: Option<&str>, text: &str) -> Content {
    Content {
        role: role.map(str::to_string),
        parts: vec![Part {
            text: text.to_string(),
        }],
    }
}

/// System messages are folded into `systemInstruction`; the rest become turns.
fn build_generate_request(request: &ChatRequest) -> GenerateRequest {
    let system_parts: Vec<Part> = request
        .messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| Part {
            text: m.content.clone(),
        })
        .collect();

    let contents = request
        .messages
        .iter()
        .filter_map(|m| match m.role {
            Role::System => None,
            Role::User => Some(text_content(Some("user"), &m.content)),
            Role::Assistant => Some(text_content(Some("model"), &m.content)),
        })
        .collect();

    let generation_config = request
        .temperature
        .map(|temperature| GenerationConfig { temperature });

    GenerateRequest {
        system_instruction: (!system_parts.is_empty()).then(|| Content {
            role: None,
            parts: system_parts,
        }),
        contents,
        generation_config,
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, ApiError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ApiError::Generation(
            "No text in Gemini response".to_string(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: ChatRequest, model: ChatModel) -> Result<String, ApiError> {
        let body = build_generate_request(&request);

        let res = self
            .client
            .post(self.model_url(model.as_str(), "generateContent"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Generation(format!("Gemini request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Generation(format!(
                "Gemini generation failed ({}): {}",
                status, text
            )));
        }

        let payload: GenerateResponse = res
            .json()
            .await
            .map_err(|e| ApiError::Generation(format!("Failed to parse Gemini response: {}", e)))?;

        extract_text(payload)
    }
}

#[async_trait]
impl Embedder for GeminiProvider {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let model_ref = format!("models/{}", self.embedding_model);
        let body = BatchEmbedRequest {
            requests: inputs
                .iter()
                .map(|text| EmbedRequest {
                    model: model_ref.clone(),
                    content: text_content(None, text),
                })
                .collect(),
        };

        let res = self
            .client
            .post(self.model_url(&self.embedding_model, "batchEmbedContents"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Gemini embed error ({}): {}",
                status, text
            )));
        }

        let payload: BatchEmbedResponse = res.json().await.map_err(ApiError::internal)?;
        if payload.embeddings.len() != inputs.len() {
            return Err(ApiError::Internal(format!(
                "Gemini returned {} embeddings for {} inputs",
                payload.embeddings.len(),
                inputs.len()
            )));
        }

        Ok(payload.embeddings.into_iter().map(|e| e.values).collect())
    }
}
