//! Text-to-vector embedding pipeline.
//!
//! Provides the [`EmbeddingProvider`] trait, the remote Gemini implementation
//! in [`gemini`], and the bounded [`cache::EmbeddingCache`] consulted before
//! every provider call. The provider is created via [`create_provider`] from
//! configuration.

pub mod cache;
pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What the embedding will be used for. Retrieval models embed stored
/// documents and search queries slightly differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(rename = "RETRIEVAL_DOCUMENT")]
    Document,
    #[serde(rename = "RETRIEVAL_QUERY")]
    Query,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "RETRIEVAL_DOCUMENT",
            Self::Query => "RETRIEVAL_QUERY",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for embedding text into vectors.
///
/// Implementations should return exactly [`EmbeddingProvider::dimensions`]
/// components; the memory store rejects anything else before persisting.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string for the given task.
    async fn embed(&self, text: &str, task: TaskType) -> Result<Vec<f32>>;

    /// Identifier of the model behind this provider.
    fn model_name(&self) -> &str;

    /// Number of dimensions this provider produces.
    fn dimensions(&self) -> usize;
}

/// Stand-in provider for operator commands that open the store but never
/// embed text (`stats`, `reindex`). Needs no API key.
pub struct OfflineProvider {
    model: String,
    dims: usize,
}

impl OfflineProvider {
    pub fn from_config(config: &crate::config::EmbeddingConfig) -> Self {
        Self {
            model: config.model.clone(),
            dims: config.dimensions,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OfflineProvider {
    async fn embed(&self, _text: &str, _task: TaskType) -> Result<Vec<f32>> {
        anyhow::bail!("embedding is unavailable in offline mode")
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Create an embedding provider from config.
///
/// Currently only `"gemini"` is supported.
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "gemini" => {
            let provider = gemini::GeminiEmbeddingProvider::from_config(config)?;
            Ok(Box::new(provider))
        }
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: gemini"),
    }
}
