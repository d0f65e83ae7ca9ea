//! Embedding providers.
//!
//! Supports multiple embedding backends: the OpenAI and Cohere APIs and a
//! deterministic local feature-hashing model. Every provider implements the
//! same contract: one string in, one fixed-length vector out. Retries and
//! backoff are a caller concern; providers fail fast.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::registry::ProviderKind;
use crate::similarity::normalize;

/// Response from embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The generated embedding.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// Dimension of the embedding.
    pub dimension: usize,

    /// Token usage (if reported by the provider).
    pub tokens_used: Option<u64>,

    /// Number of characters actually embedded when the input exceeded the
    /// provider's limit and was truncated. `None` means no truncation.
    pub truncated_chars: Option<usize>,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// The model identifier this provider serves.
    fn model_id(&self) -> &str;

    /// Which backend kind this provider wraps.
    fn kind(&self) -> ProviderKind;

    /// The fixed output dimension.
    fn dimension(&self) -> usize;

    /// Whether the provider can be used right now (API key set, etc.).
    /// This is a config-level signal; a `true` here does not guarantee that
    /// a request will succeed at call time.
    fn is_available(&self) -> bool;

    /// Generate an embedding for the given text.
    async fn embed(&self, text: &str) -> Result<EmbeddingResponse>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingResponse>> {
        // Default implementation: process sequentially
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}

/// Validate and bound a provider input.
///
/// Empty or whitespace-only input is an error. Oversized input is truncated
/// at a char boundary and the kept length reported back; truncation is never
/// silent and never an error.
fn prepare_input(text: &str, max_chars: usize) -> Result<(&str, Option<usize>)> {
    if text.trim().is_empty() {
        return Err(EmbeddingError::EmptyInput);
    }

    let char_count = text.chars().count();
    if char_count <= max_chars {
        return Ok((text, None));
    }

    let byte_end = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(i, _)| i);
    warn!("input of {char_count} chars truncated to {max_chars}");
    Ok((&text[..byte_end], Some(max_chars)))
}

/// OpenAI embedding provider.
pub struct OpenAiProvider {
    /// Model served, e.g. `text-embedding-ada-002`.
    model_id: String,

    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// Expected output dimension.
    dimension: usize,

    /// HTTP client.
    client: reqwest::Client,
}

/// Character budget per input for the OpenAI embeddings endpoint
/// (approximates the documented 8191-token limit).
const OPENAI_MAX_INPUT_CHARS: usize = 24_000;

#[derive(Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    total_tokens: u64,
}

impl OpenAiProvider {
    /// Create a provider for the given model, reading the key from
    /// `OPENAI_API_KEY`.
    pub fn new(model_id: impl Into<String>, dimension: usize) -> Self {
        Self {
            model_id: model_id.into(),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: "https://api.openai.com/v1".to_string(),
            dimension,
            client: reqwest::Client::new(),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn request_embeddings(&self, inputs: &[&str]) -> Result<OpenAiEmbeddingResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::ModelUnavailable {
                model_id: self.model_id.clone(),
            })?;

        debug!("requesting {} embeddings from {}", inputs.len(), self.model_id);

        let body = OpenAiEmbeddingRequest {
            model: &self.model_id,
            input: inputs,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::ApiRequest {
                model_id: self.model_id.clone(),
                message: e.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest {
                model_id: self.model_id.clone(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        response
            .json::<OpenAiEmbeddingResponse>()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))
    }

    fn check_dimension(&self, embedding: &Embedding) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingResponse> {
        let (input, truncated_chars) = prepare_input(text, OPENAI_MAX_INPUT_CHARS)?;

        let result = self.request_embeddings(&[input]).await?;
        let tokens_used = result.usage.map(|u| u.total_tokens);
        let embedding = result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding in response".into()))?;

        self.check_dimension(&embedding)?;

        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: self.model_id.clone(),
            tokens_used,
            truncated_chars,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingResponse>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut inputs = Vec::with_capacity(texts.len());
        let mut truncations = Vec::with_capacity(texts.len());
        for text in texts {
            let (input, truncated) = prepare_input(text, OPENAI_MAX_INPUT_CHARS)?;
            inputs.push(input);
            truncations.push(truncated);
        }

        let result = self.request_embeddings(&inputs).await?;

        if result.data.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "API returned {} embeddings for {} inputs",
                result.data.len(),
                texts.len()
            )));
        }

        let mut responses = Vec::with_capacity(texts.len());
        for (data, truncated_chars) in result.data.into_iter().zip(truncations) {
            self.check_dimension(&data.embedding)?;
            responses.push(EmbeddingResponse {
                dimension: data.embedding.len(),
                embedding: data.embedding,
                model: self.model_id.clone(),
                tokens_used: None,
                truncated_chars,
            });
        }

        Ok(responses)
    }
}

/// Cohere embedding provider.
pub struct CohereProvider {
    /// Model served, e.g. `embed-english-v3.0`.
    model_id: String,

    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// Expected output dimension.
    dimension: usize,

    /// HTTP client.
    client: reqwest::Client,
}

/// Character budget per input for the Cohere embed endpoint.
const COHERE_MAX_INPUT_CHARS: usize = 2_048;

#[derive(Serialize)]
struct CohereEmbedRequest<'a> {
    model: &'a str,
    texts: &'a [&'a str],
}

#[derive(Deserialize)]
struct CohereEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl CohereProvider {
    /// Create a provider for the given model, reading the key from
    /// `COHERE_API_KEY`.
    pub fn new(model_id: impl Into<String>, dimension: usize) -> Self {
        Self {
            model_id: model_id.into(),
            api_key: std::env::var("COHERE_API_KEY").ok(),
            base_url: "https://api.cohere.ai/v1".to_string(),
            dimension,
            client: reqwest::Client::new(),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn request_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::ModelUnavailable {
                model_id: self.model_id.clone(),
            })?;

        debug!("requesting {} embeddings from {}", texts.len(), self.model_id);

        let body = CohereEmbedRequest {
            model: &self.model_id,
            texts,
        };

        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::ApiRequest {
                model_id: self.model_id.clone(),
                message: e.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(EmbeddingError::RateLimited {
                retry_after_secs: 60,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest {
                model_id: self.model_id.clone(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let parsed = response
            .json::<CohereEmbedResponse>()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        for embedding in &parsed.embeddings {
            if embedding.len() != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: embedding.len(),
                });
            }
        }

        Ok(parsed.embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for CohereProvider {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Cohere
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingResponse> {
        let (input, truncated_chars) = prepare_input(text, COHERE_MAX_INPUT_CHARS)?;

        let embeddings = self.request_embeddings(&[input]).await?;
        let embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding in response".into()))?;

        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: self.model_id.clone(),
            tokens_used: None,
            truncated_chars,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingResponse>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut inputs = Vec::with_capacity(texts.len());
        let mut truncations = Vec::with_capacity(texts.len());
        for text in texts {
            let (input, truncated) = prepare_input(text, COHERE_MAX_INPUT_CHARS)?;
            inputs.push(input);
            truncations.push(truncated);
        }

        let embeddings = self.request_embeddings(&inputs).await?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "API returned {} embeddings for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }

        Ok(embeddings
            .into_iter()
            .zip(truncations)
            .map(|(embedding, truncated_chars)| EmbeddingResponse {
                dimension: embedding.len(),
                embedding,
                model: self.model_id.clone(),
                tokens_used: None,
                truncated_chars,
            })
            .collect())
    }
}

/// Deterministic local embedding model based on feature hashing.
///
/// Tokenizes on non-alphanumeric boundaries, lowercases, hashes each token
/// into one of `dimension` signed buckets, and L2-normalizes the counts.
/// Texts sharing tokens score higher than disjoint texts, which is enough
/// for offline model comparison and tests; it needs no credentials, no
/// network, and always produces the same vector for the same text.
pub struct HashingProvider {
    model_id: String,
    dimension: usize,
}

/// Character budget per input for the local model. Generous; only guards
/// against pathological inputs.
const LOCAL_MAX_INPUT_CHARS: usize = 100_000;

impl HashingProvider {
    /// Create a local provider for the given model identifier.
    pub fn new(model_id: impl Into<String>, dimension: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dimension,
        }
    }

    fn hash_token(token: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        hasher.finish()
    }

    fn embed_text(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let h = Self::hash_token(&token.to_lowercase());
            let bucket = (h % self.dimension as u64) as usize;
            // Sign bit decorrelates unrelated tokens that share a bucket.
            let sign = if h & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingResponse> {
        let (input, truncated_chars) = prepare_input(text, LOCAL_MAX_INPUT_CHARS)?;

        let embedding = self.embed_text(input);

        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: self.model_id.clone(),
            tokens_used: None,
            truncated_chars,
        })
    }
}
