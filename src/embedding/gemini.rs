//! Gemini embeddings provider using the `models/{model}:embedContent` endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EmbeddingProvider, TaskType};
use crate::config::EmbeddingConfig;

pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dims: usize,
}

/// Gemini model ids are addressed as `models/<name>`.
fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

fn embed_endpoint(base_url: &str, model: &str) -> String {
    format!(
        "{}/v1beta/{}:embedContent",
        base_url.trim_end_matches('/'),
        qualified_model(model)
    )
}

impl GeminiEmbeddingProvider {
    pub fn new(api_key: String, config: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: qualified_model(&config.model),
            dims: config.dimensions,
        })
    }

    /// Build a provider, reading the API key from the env var named in config.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).with_context(|| {
            format!(
                "embedding API key not set: export {} before starting",
                config.api_key_env
            )
        })?;
        let provider = Self::new(api_key, config)?;
        tracing::info!(model = %provider.model, dims = provider.dims, "gemini embedding provider ready");
        Ok(provider)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Prefer the API's own error message; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str, task: TaskType) -> Result<Vec<f32>> {
        let req = EmbedRequest {
            model: &self.model,
            content: Content {
                parts: [Part { text }],
            },
            task_type: task,
        };

        let response = self
            .client
            .post(embed_endpoint(&self.base_url, &self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await
            .context("embedding request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("HTTP {status}: {}", error_message(&body));
        }

        let resp: EmbedResponse = response
            .json()
            .await
            .context("malformed embedding response")?;
        tracing::debug!(task = %task, dims = resp.embedding.values.len(), "embedding generated");
        Ok(resp.embedding.values)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}
