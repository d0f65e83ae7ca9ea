//! Retrieval orchestration over providers, the in-memory index, and the
//! durable vector store.

use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use docqa_embeddings::provider::{CohereProvider, HashingProvider, OpenAiProvider};
use docqa_embeddings::registry::{ModelCapability, ModelDescriptor, ModelRegistry, ProviderKind};
use docqa_embeddings::{EmbeddingResponse, SearchHit, SimilarityIndex};
use docqa_vector_store::VectorStore;

use crate::config::RetrievalConfig;
use crate::error::{Result, RetrievalError};

/// Outcome of running one model in a side-by-side comparison.
///
/// Serializes with a `status` discriminator so API callers can branch without
/// sniffing fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutcome {
    /// The model embedded the corpus and query and ranked results.
    Success {
        /// Ranked hits, best first.
        results: Vec<SearchHit>,
    },
    /// The model failed; other models in the same comparison are unaffected.
    Error {
        /// Human-readable failure description.
        error: String,
    },
}

/// Per-model outcomes of a comparison, keyed in the caller's model order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComparisonResult {
    pub models: IndexMap<String, ModelOutcome>,
}

impl ComparisonResult {
    /// The ranked hits for a model, if it succeeded.
    pub fn hits(&self, model_id: &str) -> Option<&[SearchHit]> {
        match self.models.get(model_id) {
            Some(ModelOutcome::Success { results }) => Some(results),
            _ => None,
        }
    }

    /// The error message for a model, if it failed.
    pub fn error(&self, model_id: &str) -> Option<&str> {
        match self.models.get(model_id) {
            Some(ModelOutcome::Error { error }) => Some(error.as_str()),
            _ => None,
        }
    }

    /// Number of models in the result.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no models were compared.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Build a registry with the standard model lineup, wiring API keys from the
/// config. Providers without a configured key fall back to their environment
/// variables and report themselves unavailable when neither is set.
pub fn standard_registry(config: &RetrievalConfig) -> Result<ModelRegistry> {
    let mut registry = ModelRegistry::new();

    let mut openai = OpenAiProvider::new("text-embedding-ada-002", 1536);
    if let Some(key) = &config.openai_api_key {
        openai = openai.with_api_key(key.clone());
    }
    registry.register(
        ModelDescriptor::new("text-embedding-ada-002", 1536, ProviderKind::OpenAi),
        Arc::new(openai),
    )?;

    let mut cohere = CohereProvider::new("cohere-embed-v3", 1024);
    if let Some(key) = &config.cohere_api_key {
        cohere = cohere.with_api_key(key.clone());
    }
    registry.register(
        ModelDescriptor::new("cohere-embed-v3", 1024, ProviderKind::Cohere),
        Arc::new(cohere),
    )?;

    registry.register(
        ModelDescriptor::new(
            "sentence-transformers/all-MiniLM-L6-v2",
            384,
            ProviderKind::Local,
        ),
        Arc::new(HashingProvider::new(
            "sentence-transformers/all-MiniLM-L6-v2",
            384,
        )),
    )?;

    registry.register(
        ModelDescriptor::new("BAAI/bge-base-en-v1.5", 768, ProviderKind::Local),
        Arc::new(HashingProvider::new("BAAI/bge-base-en-v1.5", 768)),
    )?;

    Ok(registry)
}

/// Orchestrates question answering and model comparison.
///
/// Holds no caches and performs no retries: every call embeds fresh, and
/// transient provider failures surface to the caller.
pub struct RetrievalEngine {
    config: RetrievalConfig,
    registry: ModelRegistry,
    store: Arc<dyn VectorStore>,
}

impl RetrievalEngine {
    /// Create an engine from its three collaborators.
    pub fn new(
        config: RetrievalConfig,
        registry: ModelRegistry,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            config,
            registry,
            store,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// The model registry.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Answer a question against the durable store.
    ///
    /// Embeds the question once with `model_id` and returns the most similar
    /// stored documents, best first. Callers with no model preference pass
    /// [`RetrievalConfig::default_model`].
    pub async fn ask(&self, question: &str, model_id: &str) -> Result<Vec<SearchHit>> {
        let provider = self.registry.resolve(model_id)?;
        debug!("embedding question with {model_id}");
        let response = self.with_deadline(provider.embed(question)).await?;

        let documents = self
            .store
            .query(&response.embedding, model_id, self.config.top_k)
            .await?;
        info!(
            "retrieved {} documents for question via {model_id}",
            documents.len()
        );

        Ok(documents
            .into_iter()
            .map(|d| SearchHit::for_document(d.id, d.content, d.similarity))
            .collect())
    }

    /// Compare how several models rank the same corpus for one question.
    ///
    /// Each model independently embeds the corpus and the question and ranks
    /// with an in-memory index. A failure (or timeout) for one model is
    /// recorded as that model's [`ModelOutcome::Error`] and never aborts the
    /// others.
    pub async fn compare(
        &self,
        corpus: &[String],
        question: &str,
        model_ids: &[String],
    ) -> ComparisonResult {
        let outcomes = join_all(
            model_ids
                .iter()
                .map(|model_id| self.compare_one(corpus, question, model_id)),
        )
        .await;

        let mut models = IndexMap::with_capacity(model_ids.len());
        for (model_id, outcome) in model_ids.iter().zip(outcomes) {
            let outcome = match outcome {
                Ok(results) => ModelOutcome::Success { results },
                Err(err) => {
                    warn!("comparison failed for {model_id}: {err}");
                    ModelOutcome::Error {
                        error: err.to_string(),
                    }
                }
            };
            models.insert(model_id.clone(), outcome);
        }
        ComparisonResult { models }
    }

    async fn compare_one(
        &self,
        corpus: &[String],
        question: &str,
        model_id: &str,
    ) -> Result<Vec<SearchHit>> {
        let provider = self.registry.resolve(model_id)?;
        let mut index = SimilarityIndex::new(provider.dimension());

        if !corpus.is_empty() {
            let responses = self.with_deadline(provider.embed_batch(corpus)).await?;
            for (text, response) in corpus.iter().zip(responses) {
                index.add(text.clone(), response.embedding)?;
            }
        }

        let query = self.with_deadline(provider.embed(question)).await?;
        Ok(index.search(&query.embedding, self.config.compare_top_k)?)
    }

    /// Embed a text for storage, without querying anything.
    ///
    /// Used by the upload pipeline so stored vectors come from the same
    /// providers that serve queries.
    pub async fn embed_for_storage(
        &self,
        text: &str,
        model_id: &str,
    ) -> Result<EmbeddingResponse> {
        let provider = self.registry.resolve(model_id)?;
        self.with_deadline(provider.embed(text)).await
    }

    /// Capability listing: registered models first (registration order), then
    /// recognized-but-unconfigured ones, each with dimension and availability.
    pub fn capabilities(&self) -> Vec<ModelCapability> {
        self.registry.capabilities()
    }

    /// Model identifiers that can serve requests right now.
    pub fn list_models(&self) -> Vec<String> {
        self.registry.list_available()
    }

    async fn with_deadline<T>(
        &self,
        fut: impl std::future::Future<Output = docqa_embeddings::Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.config.timeout(), fut).await {
            Ok(result) => result.map_err(RetrievalError::from),
            Err(_) => Err(RetrievalError::Timeout {
                after_secs: self.config.timeout_secs,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use docqa_embeddings::provider::EmbeddingProvider;
    use docqa_embeddings::similarity::HitReference;
    use docqa_vector_store::InMemoryVectorStore;

    const MINILM: &str = "sentence-transformers/all-MiniLM-L6-v2";
    const BGE: &str = "BAAI/bge-base-en-v1.5";

    fn local_registry() -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        registry
            .register(
                ModelDescriptor::new(MINILM, 384, ProviderKind::Local),
                Arc::new(HashingProvider::new(MINILM, 384)),
            )
            .unwrap();
        registry
            .register(
                ModelDescriptor::new(BGE, 768, ProviderKind::Local),
                Arc::new(HashingProvider::new(BGE, 768)),
            )
            .unwrap();
        registry
    }

    fn engine_with_store(store: Arc<dyn VectorStore>) -> RetrievalEngine {
        RetrievalEngine::new(RetrievalConfig::new(), local_registry(), store)
    }

    /// Provider that never completes; stands in for a hung remote API.
    struct StuckProvider {
        dimension: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for StuckProvider {
        fn model_id(&self) -> &str {
            "stuck-model"
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

        async fn embed(&self, _text: &str) -> docqa_embeddings::Result<EmbeddingResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("sleep outlives every test deadline")
        }
    }

    #[tokio::test]
    async fn ask_returns_ranked_documents() {
        let store = Arc::new(InMemoryVectorStore::new());
        let registry = local_registry();
        let provider = registry.resolve(MINILM).unwrap();

        for (id, content) in [
            ("doc-1", "cats are small domesticated mammals"),
            ("doc-2", "rust compiles to native machine code"),
            ("doc-3", "dogs are loyal domesticated mammals"),
        ] {
            let response = provider.embed(content).await.unwrap();
            store.insert(id, format!("{id}.txt"), content, MINILM, response.embedding);
        }

        let engine = engine_with_store(store);
        let hits = engine.ask("are cats mammals", MINILM).await.unwrap();

        assert!(!hits.is_empty());
        assert_eq!(
            hits[0].reference,
            HitReference::DocumentId("doc-1".to_string())
        );
        for pair in hits.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[tokio::test]
    async fn ask_unknown_model_fails() {
        let engine = engine_with_store(Arc::new(InMemoryVectorStore::new()));
        let err = engine.ask("anything", "no-such-model").await.unwrap_err();
        assert!(matches!(err, RetrievalError::Embedding(_)));
    }

    #[tokio::test]
    async fn compare_ranks_shared_vocabulary_first() {
        let engine = engine_with_store(Arc::new(InMemoryVectorStore::new()));
        let corpus = vec![
            "cats are mammals that purr".to_string(),
            "the stock market closed higher today".to_string(),
            "dogs are mammals that bark".to_string(),
        ];
        let models = vec![MINILM.to_string(), BGE.to_string()];

        let result = engine.compare(&corpus, "are cats mammals", &models).await;

        assert_eq!(result.len(), 2);
        for model_id in &models {
            let hits = result.hits(model_id).unwrap();
            assert!(!hits.is_empty());
            assert_eq!(hits[0].reference, HitReference::CorpusIndex(0));
        }
    }

    #[tokio::test]
    async fn compare_keeps_caller_model_order() {
        let engine = engine_with_store(Arc::new(InMemoryVectorStore::new()));
        let corpus = vec!["a document".to_string()];
        let models = vec![BGE.to_string(), MINILM.to_string()];

        let result = engine.compare(&corpus, "a question", &models).await;
        let keys: Vec<&String> = result.models.keys().collect();
        assert_eq!(keys, vec![BGE, MINILM]);
    }

    #[tokio::test]
    async fn compare_isolates_failing_model() {
        let engine = engine_with_store(Arc::new(InMemoryVectorStore::new()));
        let corpus = vec!["cats are mammals".to_string()];
        let models = vec![MINILM.to_string(), "no-such-model".to_string()];

        let result = engine.compare(&corpus, "cats", &models).await;

        assert!(result.hits(MINILM).is_some());
        let error = result.error("no-such-model").unwrap();
        assert!(error.contains("no-such-model"));
    }

    #[tokio::test(start_paused = true)]
    async fn compare_timeout_does_not_block_other_models() {
        let mut registry = local_registry();
        registry
            .register(
                ModelDescriptor::new("stuck-model", 384, ProviderKind::Local),
                Arc::new(StuckProvider { dimension: 384 }),
            )
            .unwrap();
        let config = RetrievalConfig::new().with_timeout_secs(1);
        let engine = RetrievalEngine::new(config, registry, Arc::new(InMemoryVectorStore::new()));

        let corpus = vec!["cats are mammals".to_string()];
        let models = vec!["stuck-model".to_string(), MINILM.to_string()];

        // Paused time auto-advances to the deadline once the runtime idles.
        let result = engine.compare(&corpus, "cats", &models).await;

        assert!(result.hits(MINILM).is_some());
        let error = result.error("stuck-model").unwrap();
        assert!(error.contains("timed out"), "got: {error}");
    }

    #[tokio::test]
    async fn compare_empty_corpus_succeeds_with_no_hits() {
        let engine = engine_with_store(Arc::new(InMemoryVectorStore::new()));
        let models = vec![MINILM.to_string()];

        let result = engine.compare(&[], "any question", &models).await;
        assert_eq!(result.hits(MINILM), Some(&[][..]));
    }

    #[tokio::test]
    async fn compare_is_deterministic() {
        let engine = engine_with_store(Arc::new(InMemoryVectorStore::new()));
        let corpus = vec![
            "first document about cats".to_string(),
            "second document about dogs".to_string(),
        ];
        let models = vec![MINILM.to_string()];

        let first = engine.compare(&corpus, "cats", &models).await;
        let second = engine.compare(&corpus, "cats", &models).await;

        assert_eq!(first.hits(MINILM), second.hits(MINILM));
    }

    #[tokio::test]
    async fn embed_for_storage_reports_model_and_dimension() {
        let engine = engine_with_store(Arc::new(InMemoryVectorStore::new()));
        let response = engine
            .embed_for_storage("some document text", MINILM)
            .await
            .unwrap();
        assert_eq!(response.model, MINILM);
        assert_eq!(response.dimension, 384);
        assert_eq!(response.embedding.len(), 384);
    }

    #[tokio::test]
    async fn capabilities_include_unconfigured_known_models() {
        let engine = engine_with_store(Arc::new(InMemoryVectorStore::new()));
        let caps = engine.capabilities();

        let minilm = caps.iter().find(|c| c.model_id == MINILM).unwrap();
        assert!(minilm.available);

        // ada-002 has no provider in the local registry but is still listed.
        let ada = caps
            .iter()
            .find(|c| c.model_id == "text-embedding-ada-002")
            .unwrap();
        assert!(!ada.available);
        assert_eq!(ada.dimension, 1536);
    }

    #[test]
    fn comparison_result_serializes_with_status_tags() {
        let mut models = IndexMap::new();
        models.insert(
            "model-a".to_string(),
            ModelOutcome::Success {
                results: vec![SearchHit::at_index(0, "text", 0.9)],
            },
        );
        models.insert(
            "model-b".to_string(),
            ModelOutcome::Error {
                error: "boom".to_string(),
            },
        );
        let result = ComparisonResult { models };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["model-a"]["status"], "success");
        assert_eq!(json["model-b"]["status"], "error");
        assert_eq!(json["model-b"]["error"], "boom");
    }
}
