//! In-memory vector store for tests and single-node deployments.

use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::{DocumentHit, VectorStore};

struct DocumentRow {
    id: String,
    filename: String,
    content: String,
    model_id: String,
    embedding: Vec<f32>,
}

/// Vector store holding all rows in process memory.
///
/// Mirrors the pgvector adapter's ranking contract: cosine similarity,
/// descending, insertion order on ties, rows filtered by embedding model.
#[derive(Default)]
pub struct InMemoryVectorStore {
    rows: RwLock<Vec<DocumentRow>>,
}

impl InMemoryVectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document row.
    ///
    /// Exposed for the upload side and for tests; `query` never mutates.
    pub fn insert(
        &self,
        id: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<String>,
        model_id: impl Into<String>,
        embedding: Vec<f32>,
    ) {
        let mut rows = self.rows.write().unwrap_or_else(|e| e.into_inner());
        rows.push(DocumentRow {
            id: id.into(),
            filename: filename.into(),
            content: content.into(),
            model_id: model_id.into(),
            embedding,
        });
    }

    /// Number of stored rows across all models.
    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn query(
        &self,
        embedding: &[f32],
        model_id: &str,
        top_k: usize,
    ) -> Result<Vec<DocumentHit>> {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());

        let mut hits = Vec::new();
        for row in rows.iter().filter(|r| r.model_id == model_id) {
            if row.embedding.len() != embedding.len() {
                return Err(StoreError::DimensionMismatch {
                    expected: row.embedding.len(),
                    actual: embedding.len(),
                });
            }
            hits.push(DocumentHit {
                id: row.id.clone(),
                filename: row.filename.clone(),
                content: row.content.clone(),
                similarity: cosine(embedding, &row.embedding),
            });
        }

        // Stable sort keeps insertion order on score ties.
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);

        debug!("in-memory query for {model_id} returned {} hits", hits.len());
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seeded() -> InMemoryVectorStore {
        let store = InMemoryVectorStore::new();
        store.insert("a", "a.pdf", "alpha", "model-x", vec![1.0, 0.0]);
        store.insert("b", "b.pdf", "beta", "model-x", vec![0.0, 1.0]);
        store.insert("c", "c.pdf", "gamma", "model-x", vec![0.9, 0.1]);
        store
    }

    #[tokio::test]
    async fn test_query_ranks_by_cosine() {
        let store = seeded();
        let hits = store.query(&[1.0, 0.0], "model-x", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[1].id, "c");
        assert!(hits[0].similarity > hits[1].similarity);
    }

    #[tokio::test]
    async fn test_query_filters_by_model() {
        let store = seeded();
        store.insert("d", "d.pdf", "delta", "model-y", vec![1.0, 0.0, 0.0]);

        let hits = store.query(&[1.0, 0.0], "model-x", 10).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.id != "d"));
    }

    #[tokio::test]
    async fn test_query_mismatched_dimension_is_error() {
        let store = seeded();
        let result = store.query(&[1.0, 0.0, 0.0], "model-x", 5).await;
        assert!(matches!(
            result,
            Err(StoreError::DimensionMismatch {
                expected: 2,
                actual: 3,
            })
        ));
    }

    #[tokio::test]
    async fn test_query_unknown_model_returns_empty() {
        let store = seeded();
        let hits = store.query(&[1.0, 0.0], "model-z", 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let store = InMemoryVectorStore::new();
        store.insert("first", "1.pdf", "one", "m", vec![1.0, 0.0]);
        store.insert("second", "2.pdf", "two", "m", vec![2.0, 0.0]);

        let hits = store.query(&[1.0, 0.0], "m", 2).await.unwrap();
        assert_eq!(hits[0].id, "first");
        assert_eq!(hits[1].id, "second");
    }
}
