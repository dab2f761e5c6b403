//! Text embedders

use crate::config::{EmbedderKind, VectorStoreConfig};
use crate::index::{IndexError, IndexResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// Width used by the hashing embedder when none is configured
pub const DEFAULT_HASHING_DIMENSIONS: usize = 384;

const OPENAI_TIMEOUT: Duration = Duration::from_secs(30);
const OPENAI_MAX_RETRIES: usize = 3;

/// Turns text into a vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &str;

    async fn embed(&self, text: &str) -> IndexResult<Vec<f32>>;
}

/// Builds the embedder selected in `[vector-store]`
pub fn embedder_from_config(config: &VectorStoreConfig) -> IndexResult<Arc<dyn Embedder>> {
    match config.embedder {
        EmbedderKind::Hashing => Ok(Arc::new(HashingEmbedder::new(
            config.dimensions.unwrap_or(DEFAULT_HASHING_DIMENSIONS),
        ))),
        EmbedderKind::Openai => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                IndexError::Config("openai embedder needs an API key".to_string())
            })?;
            Ok(Arc::new(OpenAiEmbedder::new(
                &api_key,
                &config.api_base,
                &config.model,
                config.dimensions,
                OPENAI_TIMEOUT,
            )?))
        }
    }
}

/// Bag-of-words feature hashing
///
/// Each lowercase alphanumeric token is hashed with SHA-256; the digest picks a
/// bucket and a sign. The summed vector is L2-normalized, so texts sharing
/// vocabulary end up close in cosine distance.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase);

        for token in tokens {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let index = (u64::from_le_bytes(bucket) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    async fn embed(&self, text: &str) -> IndexResult<Vec<f32>> {
        Ok(self.embed_sync(text))
    }
}

/// Client for OpenAI-compatible embedding endpoints
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
}

impl OpenAiEmbedder {
    /// Builds a client posting to `{base_url}/embeddings`
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        dimensions: Option<usize>,
        timeout: Duration,
    ) -> IndexResult<Self> {
        if api_key.trim().is_empty() {
            return Err(IndexError::Config("missing API key".to_string()));
        }
        if model.trim().is_empty() {
            return Err(IndexError::Config("missing model name".to_string()));
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| IndexError::Config("API key is not a valid header value".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            dimensions,
        })
    }

    fn should_retry(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn retry_backoff(attempt: usize) -> Duration {
        Duration::from_millis(250 * (1 << attempt.min(4)))
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed(&self, text: &str) -> IndexResult<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: [text],
            dimensions: self.dimensions,
        };

        let mut attempt = 0;
        loop {
            let response = self.client.post(&self.endpoint).json(&request).send().await?;
            let status = response.status();

            if status.is_success() {
                let mut parsed: EmbeddingResponse = response.json().await?;
                parsed.data.sort_by_key(|entry| entry.index);
                return parsed
                    .data
                    .into_iter()
                    .next()
                    .map(|entry| entry.embedding)
                    .ok_or_else(|| IndexError::Embedding("response held no embeddings".to_string()));
            }

            if Self::should_retry(status) && attempt + 1 < OPENAI_MAX_RETRIES {
                attempt += 1;
                tracing::debug!("Embedding request returned {}, retrying", status);
                tokio::time::sleep(Self::retry_backoff(attempt)).await;
                continue;
            }

            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(IndexError::Embedding(format!("{}: {}", status, body)));
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
