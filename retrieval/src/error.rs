//! Error types for the retrieval engine.

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors surfaced by the retrieval engine.
///
/// `ask` propagates the first fatal error; `compare` captures errors
/// per model so one broken model never blocks the others.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Embedding error (unavailable model, provider failure, dimension
    /// mismatch).
    #[error("embedding error: {0}")]
    Embedding(#[from] docqa_embeddings::EmbeddingError),

    /// Vector store error.
    #[error("store error: {0}")]
    Store(#[from] docqa_vector_store::StoreError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A provider call exceeded the configured deadline. Recoverable; the
    /// caller decides whether to retry.
    #[error("provider call timed out after {after_secs}s")]
    Timeout { after_secs: u64 },
}
