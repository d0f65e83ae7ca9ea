//! In-memory exact nearest-neighbor index over a small corpus.
//!
//! Built fresh per comparison call from a caller-supplied document set and
//! discarded afterwards. Entries keep their corpus position, so score ties
//! rank in original corpus order and results are reproducible.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::similarity::{SearchHit, dot_product, normalize, top_k_positions};

/// An entry in the similarity index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Position in the original corpus.
    pub position: usize,

    /// The document text.
    pub content: String,

    /// The embedding vector (L2-normalized unless degenerate).
    pub embedding: Embedding,

    /// Whether the embedding had zero norm and is excluded from ranking.
    pub degenerate: bool,
}

/// Exact top-k cosine search over an in-memory document set for one model.
///
/// Document vectors are normalized on insertion and the query on search, so
/// scoring is a plain inner product, mathematically equal to cosine
/// similarity.
pub struct SimilarityIndex {
    /// Entries in corpus order.
    entries: Vec<IndexEntry>,

    /// Expected dimension of embeddings.
    dimension: usize,
}

impl SimilarityIndex {
    /// Create an empty index for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            entries: Vec::new(),
            dimension,
        }
    }

    /// Append a document at the next corpus position.
    ///
    /// A zero-norm embedding is kept but marked degenerate: it never ranks,
    /// and never causes a division by zero. Duplicate texts are allowed and
    /// keep their own positions.
    pub fn add(&mut self, content: impl Into<String>, mut embedding: Embedding) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let position = self.entries.len();
        let degenerate = !normalize(&mut embedding);
        if degenerate {
            warn!("zero-norm embedding at corpus position {position}, excluded from ranking");
        }

        self.entries.push(IndexEntry {
            position,
            content: content.into(),
            embedding,
            degenerate,
        });
        Ok(())
    }

    /// Number of indexed documents (degenerate entries included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no documents.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Corpus positions whose embeddings were degenerate.
    pub fn degenerate_positions(&self) -> Vec<usize> {
        self.entries
            .iter()
            .filter(|e| e.degenerate)
            .map(|e| e.position)
            .collect()
    }

    /// Search for the top-k most similar documents.
    ///
    /// Returns at most `k` hits sorted by similarity descending, ties broken
    /// by corpus position. A corpus smaller than `k` yields all rankable
    /// hits; an empty corpus yields an empty result. A zero-norm query
    /// cannot be ranked against anything and yields an empty result.
    pub fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut query = query.clone();
        if !normalize(&mut query) {
            warn!("zero-norm query embedding, returning no hits");
            return Ok(Vec::new());
        }

        let mut scores = Vec::with_capacity(self.entries.len());
        for entry in self.entries.iter().filter(|e| !e.degenerate) {
            let score = dot_product(&query, &entry.embedding)?;
            scores.push((entry.position, score));
        }

        let ranked = top_k_positions(&scores, k);
        debug!("ranked {} of {} documents", ranked.len(), self.entries.len());

        Ok(ranked
            .into_iter()
            .map(|(position, score)| {
                SearchHit::at_index(position, self.entries[position].content.clone(), score)
            })
            .collect())
    }
}
