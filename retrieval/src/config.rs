//! Configuration for the retrieval engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the retrieval engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Model used when the caller does not name one.
    pub default_model: String,

    /// Number of hits returned by `ask`.
    pub top_k: usize,

    /// Number of hits returned per model by `compare`.
    pub compare_top_k: usize,

    /// Deadline for a single provider call, in seconds.
    pub timeout_secs: u64,

    /// OpenAI API key. Falls back to `OPENAI_API_KEY` when unset.
    pub openai_api_key: Option<String>,

    /// Cohere API key. Falls back to `COHERE_API_KEY` when unset.
    pub cohere_api_key: Option<String>,

    /// Postgres connection string for the durable store.
    pub database_url: Option<String>,
}

impl RetrievalConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            default_model: "text-embedding-ada-002".to_string(),
            top_k: 5,
            compare_top_k: 3,
            timeout_secs: 30,
            openai_api_key: None,
            cohere_api_key: None,
            database_url: None,
        }
    }

    /// Create a configuration, reading credentials from the environment.
    pub fn from_env() -> Self {
        Self {
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            cohere_api_key: std::env::var("COHERE_API_KEY").ok(),
            database_url: std::env::var("DATABASE_URL").ok(),
            ..Self::new()
        }
    }

    /// Set the default model.
    pub fn with_default_model(mut self, model_id: impl Into<String>) -> Self {
        self.default_model = model_id.into();
        self
    }

    /// Set the `ask` hit count.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the per-model `compare` hit count.
    pub fn with_compare_top_k(mut self, top_k: usize) -> Self {
        self.compare_top_k = top_k;
        self
    }

    /// Set the provider deadline.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// The provider deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self::new()
    }
}
