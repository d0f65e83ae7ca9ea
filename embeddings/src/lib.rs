//! # Embeddings
//!
//! This crate turns text into dense vectors and ranks passages by semantic
//! similarity for the document Q&A retrieval core.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to dense vectors via remote APIs
//!   (OpenAI, Cohere) or a deterministic local model
//! - **Model Registry**: Track which models are configured, their dimensions,
//!   and whether their credentials are present
//! - **Similarity Search**: Exact top-k cosine search over a caller-supplied
//!   corpus, with stable ordering
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Embeddings System                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ModelRegistry ──► EmbeddingProvider ──► Embedding              │
//! │       │                  │                   │                  │
//! │       ▼                  ▼                   ▼                  │
//! │  capabilities     OpenAI/Cohere/Local   SimilarityIndex         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod index;
pub mod provider;
pub mod registry;
pub mod similarity;

pub use error::{EmbeddingError, Result};
pub use index::SimilarityIndex;
pub use provider::{
    CohereProvider, EmbeddingProvider, EmbeddingResponse, HashingProvider, OpenAiProvider,
};
pub use registry::{ModelCapability, ModelDescriptor, ModelRegistry, ProviderKind};
pub use similarity::{HitReference, SearchHit, cosine_similarity};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
