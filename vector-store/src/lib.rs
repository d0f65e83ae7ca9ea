//! # Vector Store
//!
//! Durable storage adapters for document embeddings. The retrieval engine
//! queries these stores for nearest neighbors at scale instead of rebuilding
//! an in-memory index per call.
//!
//! Two implementations share one contract:
//!
//! - [`PgVectorStore`]: PostgreSQL with the pgvector extension, the
//!   production backend.
//! - [`InMemoryVectorStore`]: a small in-process store for tests and
//!   single-node deployments.
//!
//! Both report similarity as `1 - cosine_distance`, on the same [-1, 1]
//! scale as the in-memory comparison index, so results from either backend
//! are directly comparable.
//!
//! The core treats stored rows as read-only: uploads and deletions belong to
//! collaborating services.

pub mod error;
pub mod memory;
pub mod pgvector;

pub use error::{Result, StoreError};
pub use memory::InMemoryVectorStore;
pub use pgvector::PgVectorStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A document row returned by a nearest-neighbor query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentHit {
    /// Row identifier.
    pub id: String,

    /// Original filename of the uploaded document.
    pub filename: String,

    /// Extracted document text.
    pub content: String,

    /// Similarity to the query vector, in [-1, 1].
    pub similarity: f32,
}

/// Abstract durable vector store.
///
/// Only rows whose embedding was produced by the requested model are
/// eligible; vectors of a different dimension are never silently compared.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return the `top_k` most similar documents embedded with `model_id`,
    /// ordered by similarity descending.
    async fn query(
        &self,
        embedding: &[f32],
        model_id: &str,
        top_k: usize,
    ) -> Result<Vec<DocumentHit>>;
}
