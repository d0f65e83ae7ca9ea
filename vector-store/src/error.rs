//! Error types for the vector store adapters.

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in a vector store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The query vector's dimension disagrees with the model's stored rows.
    /// Fatal for the affected query; never silently coerced.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The store has no dimension registered for this model.
    #[error("no rows registered for model {model_id}")]
    UnknownModel { model_id: String },

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
