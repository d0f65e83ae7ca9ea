//! Similarity computation for embeddings.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical vectors
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (magnitude_a * magnitude_b))
}

/// Compute the dot product between two embeddings.
///
/// Equivalent to cosine similarity when both inputs are unit length.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Normalize an embedding to unit length in place.
///
/// Returns `false` for a zero-norm vector, which is left untouched: callers
/// must exclude such vectors from ranking rather than divide by zero.
pub fn normalize(embedding: &mut Embedding) -> bool {
    let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in embedding.iter_mut() {
            *x /= magnitude;
        }
        true
    } else {
        false
    }
}

/// Identifies the passage a [`SearchHit`] refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitReference {
    /// A persisted document row.
    DocumentId(String),
    /// A position in the caller-supplied in-memory corpus.
    CorpusIndex(usize),
}

/// A ranked similarity search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Which passage matched.
    pub reference: HitReference,

    /// The matched passage text.
    pub content: String,

    /// Similarity score in [-1, 1].
    pub similarity: f32,
}

impl SearchHit {
    /// Create a hit referring to a corpus position.
    pub fn at_index(index: usize, content: impl Into<String>, similarity: f32) -> Self {
        Self {
            reference: HitReference::CorpusIndex(index),
            content: content.into(),
            similarity,
        }
    }

    /// Create a hit referring to a persisted document.
    pub fn for_document(id: impl Into<String>, content: impl Into<String>, similarity: f32) -> Self {
        Self {
            reference: HitReference::DocumentId(id.into()),
            content: content.into(),
            similarity,
        }
    }
}

/// Select the top-k scored positions, descending by score.
///
/// `scores` must be in corpus order; the sort is stable, so score ties keep
/// their original corpus order.
pub fn top_k_positions(scores: &[(usize, f32)], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.to_vec();
    ranked.sort_by_key(|(_, score)| std::cmp::Reverse(OrderedFloat(*score)));
    ranked.truncate(k);
    ranked
}
