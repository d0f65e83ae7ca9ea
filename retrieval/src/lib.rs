//! # Retrieval Engine
//!
//! Orchestrates document question answering across:
//!
//! - **Embeddings**: pluggable providers, a model registry, and an exact
//!   in-memory similarity index
//! - **Vector Store**: durable nearest-neighbor storage (pgvector or
//!   in-memory)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Retrieval Engine                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │   ask ──────────┐            compare ──────────┐            │
//! │                 ▼                              ▼            │
//! │          ┌──────────────┐              ┌──────────────┐     │
//! │          │    Model     │              │    Model     │     │
//! │          │   Registry   │              │   Registry   │     │
//! │          └──────┬───────┘              └──────┬───────┘     │
//! │                 │ embed query                 │ embed all   │
//! │                 ▼                             ▼             │
//! │          ┌──────────────┐              ┌──────────────┐     │
//! │          │    Vector    │              │  Similarity  │     │
//! │          │    Store     │              │    Index     │     │
//! │          └──────────────┘              └──────────────┘     │
//! │                 │                             │             │
//! │                 └──────────────┬──────────────┘             │
//! │                                ▼                            │
//! │                          ranked hits                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docqa_retrieval::{standard_registry, RetrievalConfig, RetrievalEngine};
//!
//! let config = RetrievalConfig::from_env();
//! let registry = standard_registry(&config)?;
//! let store = Arc::new(PgVectorStore::connect(&database_url, 5).await?);
//! let engine = RetrievalEngine::new(config, registry, store);
//!
//! let hits = engine.ask("what is quantum computing?", "text-embedding-ada-002").await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;

pub use config::RetrievalConfig;
pub use engine::{standard_registry, ComparisonResult, ModelOutcome, RetrievalEngine};
pub use error::{Result, RetrievalError};

// Re-export from dependencies for convenience
pub use docqa_embeddings::{
    EmbeddingProvider, HitReference, ModelRegistry, SearchHit, SimilarityIndex,
};
pub use docqa_vector_store::{DocumentHit, VectorStore};
