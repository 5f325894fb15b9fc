use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use codevec_core::config::EmbeddingSettings;
use codevec_core::{Embedder, EmbeddingError};

/// Client for OpenAI-compatible `POST {base_url}/embeddings` endpoints.
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    dim: usize,
    timeout_secs: u64,
    id: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// Build from settings. The credential comes from `embedding.api_key` or `OPENAI_API_KEY`.
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = settings
            .resolved_api_key()
            .ok_or_else(|| anyhow!("No embedding API key: set embedding.api_key or OPENAI_API_KEY"))?;
        let client = Client::builder().timeout(Duration::from_secs(settings.timeout_secs)).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", settings.base_url.trim_end_matches('/')),
            api_key,
            model: settings.model.clone(),
            dim: settings.dimension,
            timeout_secs: settings.timeout_secs,
            id: format!("openai:{}:d{}", settings.model, settings.dimension),
        })
    }

    fn request_error(&self, e: reqwest::Error) -> EmbeddingError {
        if e.is_timeout() { EmbeddingError::Timeout(self.timeout_secs) } else { EmbeddingError::Transport(e.to_string()) }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = EmbeddingRequest { input: text, model: &self.model };
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(EmbeddingError::Auth(status.as_u16()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status { status: status.as_u16(), body });
        }
        let parsed: EmbeddingResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() { EmbeddingError::Timeout(self.timeout_secs) } else { EmbeddingError::Malformed(e.to_string()) }
        })?;
        let embedding = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Malformed("response contained no embeddings".to_string()))?
            .embedding;
        if embedding.len() != self.dim {
            return Err(EmbeddingError::DimensionMismatch { expected: self.dim, got: embedding.len() });
        }
        debug!(chars = text.len(), model = %self.model, "embedded text");
        Ok(embedding)
    }
}
