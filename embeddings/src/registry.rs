//! Model registry: which embedding models are configured and usable.
//!
//! The registry is constructed once at startup and handed to the retrieval
//! engine; there is no hidden global state. Availability is a config-level
//! signal (credentials present), deliberately distinct from request-time
//! provider failures.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EmbeddingError, Result};
use crate::provider::EmbeddingProvider;

/// Which backend serves a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI embeddings API.
    OpenAi,
    /// Cohere embeddings API.
    Cohere,
    /// Local embedding model.
    Local,
}

/// Static description of a registered model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Model identifier, e.g. `text-embedding-ada-002`.
    pub model_id: String,

    /// Fixed dimension of every vector the model produces.
    pub dimension: usize,

    /// Backend kind.
    pub kind: ProviderKind,
}

impl ModelDescriptor {
    /// Create a new descriptor.
    pub fn new(model_id: impl Into<String>, dimension: usize, kind: ProviderKind) -> Self {
        Self {
            model_id: model_id.into(),
            dimension,
            kind,
        }
    }
}

/// One row of a capability listing: a known model, its dimension, and
/// whether it can currently serve requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCapability {
    /// Model identifier.
    pub model_id: String,

    /// Vector dimension.
    pub dimension: usize,

    /// Whether the model resolves to a usable provider right now.
    pub available: bool,
}

/// Well-known embedding dimensions, used for capability listings when a
/// model is recognized but not currently configured.
const KNOWN_DIMENSIONS: &[(&str, usize)] = &[
    ("text-embedding-ada-002", 1536),
    ("BAAI/bge-large-en-v1.5", 1024),
    ("BAAI/bge-base-en-v1.5", 768),
    ("intfloat/e5-large-v2", 1024),
    ("intfloat/e5-base-v2", 768),
    ("sentence-transformers/all-MiniLM-L6-v2", 384),
    ("cohere-embed-v3", 1024),
];

/// Dimension assumed for models absent from [`KNOWN_DIMENSIONS`].
const FALLBACK_DIMENSION: usize = 1536;

/// Look up the default dimension for a model identifier.
pub fn default_dimension(model_id: &str) -> usize {
    KNOWN_DIMENSIONS
        .iter()
        .find(|(id, _)| *id == model_id)
        .map_or(FALLBACK_DIMENSION, |(_, dim)| *dim)
}

struct Registration {
    descriptor: ModelDescriptor,
    provider: Arc<dyn EmbeddingProvider>,
}

/// The set of configured embedding providers, keyed by model identifier.
///
/// Registration order is preserved, so capability listings are stable.
#[derive(Default)]
pub struct ModelRegistry {
    models: Vec<Registration>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model.
    ///
    /// Idempotent: registering the same model with an identical descriptor is
    /// a no-op. Re-registering with a different dimension or kind is a
    /// [`EmbeddingError::Configuration`] error.
    pub fn register(
        &mut self,
        descriptor: ModelDescriptor,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<()> {
        if provider.dimension() != descriptor.dimension {
            return Err(EmbeddingError::Configuration(format!(
                "provider for {} produces {}-dimensional vectors, descriptor says {}",
                descriptor.model_id,
                provider.dimension(),
                descriptor.dimension
            )));
        }

        if let Some(existing) = self
            .models
            .iter()
            .find(|r| r.descriptor.model_id == descriptor.model_id)
        {
            if existing.descriptor == descriptor {
                debug!("model {} already registered", descriptor.model_id);
                return Ok(());
            }
            return Err(EmbeddingError::Configuration(format!(
                "model {} already registered with dimension {} ({:?}), cannot re-register with dimension {} ({:?})",
                descriptor.model_id,
                existing.descriptor.dimension,
                existing.descriptor.kind,
                descriptor.dimension,
                descriptor.kind
            )));
        }

        debug!(
            "registered model {} ({:?}, {} dims)",
            descriptor.model_id, descriptor.kind, descriptor.dimension
        );
        self.models.push(Registration {
            descriptor,
            provider,
        });
        Ok(())
    }

    /// Resolve a model to its provider.
    ///
    /// Fails with [`EmbeddingError::ModelUnavailable`] when the model is not
    /// registered or its provider's credentials are absent.
    pub fn resolve(&self, model_id: &str) -> Result<Arc<dyn EmbeddingProvider>> {
        let registration = self
            .models
            .iter()
            .find(|r| r.descriptor.model_id == model_id)
            .ok_or_else(|| EmbeddingError::ModelUnavailable {
                model_id: model_id.to_string(),
            })?;

        if !registration.provider.is_available() {
            return Err(EmbeddingError::ModelUnavailable {
                model_id: model_id.to_string(),
            });
        }

        Ok(Arc::clone(&registration.provider))
    }

    /// The dimension of a model's vectors.
    ///
    /// Falls back to the well-known defaults for recognized but unregistered
    /// models, so capability listings work without live credentials.
    pub fn dimension_of(&self, model_id: &str) -> usize {
        self.models
            .iter()
            .find(|r| r.descriptor.model_id == model_id)
            .map_or_else(
                || default_dimension(model_id),
                |r| r.descriptor.dimension,
            )
    }

    /// Model identifiers with a resolvable provider.
    pub fn list_available(&self) -> Vec<String> {
        self.models
            .iter()
            .filter(|r| r.provider.is_available())
            .map(|r| r.descriptor.model_id.clone())
            .collect()
    }

    /// Every known model with its dimension and current availability.
    ///
    /// Registered models come first in registration order, then recognized
    /// but unregistered models from the defaults table.
    pub fn capabilities(&self) -> Vec<ModelCapability> {
        let mut listing: Vec<ModelCapability> = self
            .models
            .iter()
            .map(|r| ModelCapability {
                model_id: r.descriptor.model_id.clone(),
                dimension: r.descriptor.dimension,
                available: r.provider.is_available(),
            })
            .collect();

        for (model_id, dimension) in KNOWN_DIMENSIONS {
            if !listing.iter().any(|c| c.model_id == *model_id) {
                listing.push(ModelCapability {
                    model_id: (*model_id).to_string(),
                    dimension: *dimension,
                    available: false,
                });
            }
        }

        listing
    }

    /// Whether a model is registered (regardless of availability).
    pub fn contains(&self, model_id: &str) -> bool {
        self.models
            .iter()
            .any(|r| r.descriptor.model_id == model_id)
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no models are registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::HashingProvider;
    use pretty_assertions::assert_eq;

    fn local(model_id: &str, dimension: usize) -> Arc<dyn EmbeddingProvider> {
        Arc::new(HashingProvider::new(model_id, dimension))
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ModelRegistry::new();
        registry
            .register(
                ModelDescriptor::new("local-a", 64, ProviderKind::Local),
                local("local-a", 64),
            )
            .unwrap();

        let provider = registry.resolve("local-a").unwrap();
        assert_eq!(provider.model_id(), "local-a");
        assert_eq!(provider.dimension(), 64);
    }

    #[test]
    fn test_resolve_unknown_model() {
        let registry = ModelRegistry::new();
        assert!(matches!(
            registry.resolve("no-such-model"),
            Err(EmbeddingError::ModelUnavailable { model_id }) if model_id == "no-such-model"
        ));
    }

    #[test]
    fn test_register_idempotent() {
        let mut registry = ModelRegistry::new();
        let descriptor = ModelDescriptor::new("local-a", 64, ProviderKind::Local);
        registry
            .register(descriptor.clone(), local("local-a", 64))
            .unwrap();
        registry.register(descriptor, local("local-a", 64)).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_conflicting_dimension_is_error() {
        let mut registry = ModelRegistry::new();
        registry
            .register(
                ModelDescriptor::new("local-a", 64, ProviderKind::Local),
                local("local-a", 64),
            )
            .unwrap();

        let result = registry.register(
            ModelDescriptor::new("local-a", 128, ProviderKind::Local),
            local("local-a", 128),
        );
        assert!(matches!(result, Err(EmbeddingError::Configuration(_))));
    }

    #[test]
    fn test_register_descriptor_provider_disagreement_is_error() {
        let mut registry = ModelRegistry::new();
        let result = registry.register(
            ModelDescriptor::new("local-a", 64, ProviderKind::Local),
            local("local-a", 32),
        );
        assert!(matches!(result, Err(EmbeddingError::Configuration(_))));
    }

    #[test]
    fn test_dimension_of_falls_back_to_known_defaults() {
        let registry = ModelRegistry::new();
        assert_eq!(registry.dimension_of("text-embedding-ada-002"), 1536);
        assert_eq!(
            registry.dimension_of("sentence-transformers/all-MiniLM-L6-v2"),
            384
        );
        assert_eq!(registry.dimension_of("completely-unknown-model"), 1536);
    }

    #[test]
    fn test_dimension_of_prefers_registered() {
        let mut registry = ModelRegistry::new();
        registry
            .register(
                ModelDescriptor::new("text-embedding-ada-002", 8, ProviderKind::Local),
                local("text-embedding-ada-002", 8),
            )
            .unwrap();
        assert_eq!(registry.dimension_of("text-embedding-ada-002"), 8);
    }

    #[test]
    fn test_capabilities_include_unregistered_known_models() {
        let mut registry = ModelRegistry::new();
        registry
            .register(
                ModelDescriptor::new("local-a", 64, ProviderKind::Local),
                local("local-a", 64),
            )
            .unwrap();

        let caps = registry.capabilities();
        assert_eq!(caps[0].model_id, "local-a");
        assert!(caps[0].available);

        let ada = caps
            .iter()
            .find(|c| c.model_id == "text-embedding-ada-002")
            .unwrap();
        assert_eq!(ada.dimension, 1536);
        assert!(!ada.available);
    }

    #[test]
    fn test_list_available_skips_unavailable_providers() {
        use crate::provider::OpenAiProvider;

        let mut registry = ModelRegistry::new();
        registry
            .register(
                ModelDescriptor::new("local-a", 64, ProviderKind::Local),
                local("local-a", 64),
            )
            .unwrap();
        // Registered but no credentials: listed as known, not as available.
        let keyless = OpenAiProvider::new("text-embedding-ada-002", 1536).with_base_url("http://x");
        if keyless.is_available() {
            // Environment provides a key; nothing to assert.
            return;
        }
        registry
            .register(
                ModelDescriptor::new("text-embedding-ada-002", 1536, ProviderKind::OpenAi),
                Arc::new(keyless),
            )
            .unwrap();

        assert_eq!(registry.list_available(), vec!["local-a".to_string()]);
        assert!(registry.contains("text-embedding-ada-002"));
        assert!(matches!(
            registry.resolve("text-embedding-ada-002"),
            Err(EmbeddingError::ModelUnavailable { .. })
        ));
    }
}
