//! Embedding provider seam and the HTTP client implementation.
//!
//! The engine only sees the [`EmbeddingProvider`] trait. The concrete
//! client speaks the Ollama-compatible `/api/embed` protocol and wraps
//! every request in bounded exponential backoff so a transient provider
//! failure cannot corrupt the chunk/vector pairing mid-ingestion.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tessel_core::config::{RagSettings, RetryPolicy};
use tracing::warn;

use crate::errors::{RagError, RagResult};

/// Converts text into fixed-length vectors.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Vector dimensionality. Must match the store's index; checked once at
    /// engine startup.
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> RagResult<Vec<f32>>;

    async fn embed_batch(&self, inputs: &[String]) -> RagResult<Vec<Vec<f32>>>;
}

/// HTTP embedding client for Ollama-compatible backends.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingClient {
    base_url: String,
    model: String,
    dimension: usize,
    retry: RetryPolicy,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpEmbeddingClient {
    pub fn new(settings: &RagSettings) -> Self {
        Self {
            base_url: settings.embedding_url.trim_end_matches('/').to_string(),
            model: settings.embedding_model.clone(),
            dimension: settings.embedding_dim,
            retry: settings.retry.clone(),
            api_key: None,
            client: reqwest::Client::new(),
        }
    }

    /// Attach a bearer token for hosted backends.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    async fn request_embeddings(&self, inputs: &[String]) -> RagResult<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);
        let body = EmbedRequest {
            model: self.model.clone(),
            input: inputs.to_vec(),
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RagError::EmbeddingProvider(format!(
                "embedding request failed: {status} {text}"
            )));
        }

        let payload: EmbedResponse = response.json().await?;

        if let Some(embeddings) = payload.embeddings {
            return Ok(embeddings);
        }
        if let Some(embedding) = payload.embedding {
            return Ok(vec![embedding]);
        }

        Err(RagError::EmbeddingProvider(
            "embedding response missing vectors".to_string(),
        ))
    }

    fn check_dimensions(&self, vectors: &[Vec<f32>]) -> RagResult<()> {
        for vector in vectors {
            if vector.len() != self.dimension {
                return Err(RagError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        let inputs = [text.to_string()];
        let mut vectors = self.embed_batch(&inputs).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::EmbeddingProvider("empty embedding response".to_string()))
    }

    async fn embed_batch(&self, inputs: &[String]) -> RagResult<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let vectors =
            retry_with_backoff(&self.retry, "embed_batch", || self.request_embeddings(inputs))
                .await?;

        if vectors.len() != inputs.len() {
            return Err(RagError::EmbeddingProvider(format!(
                "expected {} vectors, got {}",
                inputs.len(),
                vectors.len()
            )));
        }
        self.check_dimensions(&vectors)?;
        Ok(vectors)
    }
}

/// Run `op` with bounded exponential backoff. Shared by every provider call
/// on both the ingestion and query paths.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> RagResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RagResult<T>>,
{
    let mut delay = Duration::from_millis(policy.base_delay_ms);
    let mut attempt = 1u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts.max(1) => {
                warn!(operation, attempt, error = %err, "request failed, backing off");
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Option<Vec<Vec<f32>>>,
    embedding: Option<Vec<f32>>,
}
