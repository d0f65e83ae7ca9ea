//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings system.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Bad registry state, e.g. re-registering a model with a different
    /// dimension. Fatal; surfaced immediately.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The model is not registered or its provider credentials are absent.
    /// This is a static/config-level signal, distinct from request-time
    /// failures.
    #[error("model unavailable: {model_id}")]
    ModelUnavailable { model_id: String },

    /// Input text was empty or whitespace-only.
    #[error("cannot embed empty input")]
    EmptyInput,

    /// API request failed.
    #[error("embedding request failed for {model_id}: {message}")]
    ApiRequest { model_id: String, message: String },

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Dimension mismatch. A programming/data error; never silently coerced.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
