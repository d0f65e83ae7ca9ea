//! PostgreSQL + pgvector adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::{DocumentHit, VectorStore};

/// Durable vector store backed by PostgreSQL with the pgvector extension.
///
/// Rows live in the `documents` table written by the upload service; this
/// adapter only reads. The `embedding` column is untyped `vector` so one
/// table can hold rows from models of different dimensions, with
/// `embedding_model` recording which model produced each row.
pub struct PgVectorStore {
    pool: PgPool,

    /// Expected vector dimension per model, checked before every query.
    dimensions: HashMap<String, usize>,
}

impl PgVectorStore {
    /// Connect to the database.
    pub async fn connect(uri: &str, pool_size: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .connect(uri)
            .await?;

        info!("connected pgvector store (pool size {pool_size})");

        Ok(Self {
            pool,
            dimensions: HashMap::new(),
        })
    }

    /// Declare the vector dimension for a model's rows.
    pub fn with_model(mut self, model_id: impl Into<String>, dimension: usize) -> Self {
        self.dimensions.insert(model_id.into(), dimension);
        self
    }

    /// Ensure the pgvector extension and the `documents` table exist.
    ///
    /// Idempotent; safe to run at startup even when the upload service owns
    /// the schema.
    pub async fn initialize(&self) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                filename TEXT NOT NULL,
                filetype TEXT NOT NULL,
                content TEXT NOT NULL,
                embedding vector,
                embedding_model TEXT,
                uploaded_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_model ON documents(embedding_model)",
        )
        .execute(&self.pool)
        .await?;

        info!("documents table ready");
        Ok(())
    }

    /// Number of rows embedded with the given model.
    pub async fn count_embedded(&self, model_id: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents
             WHERE embedding IS NOT NULL AND embedding_model = $1",
        )
        .bind(model_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }
}

/// Render an embedding as a pgvector literal, e.g. `[0.1,0.2,0.3]`.
fn vector_literal(embedding: &[f32]) -> String {
    let mut literal = String::with_capacity(embedding.len() * 8 + 2);
    literal.push('[');
    for (i, v) in embedding.iter().enumerate() {
        if i > 0 {
            literal.push(',');
        }
        literal.push_str(&v.to_string());
    }
    literal.push(']');
    literal
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn query(
        &self,
        embedding: &[f32],
        model_id: &str,
        top_k: usize,
    ) -> Result<Vec<DocumentHit>> {
        let expected =
            *self
                .dimensions
                .get(model_id)
                .ok_or_else(|| StoreError::UnknownModel {
                    model_id: model_id.to_string(),
                })?;
        if embedding.len() != expected {
            return Err(StoreError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }

        let literal = vector_literal(embedding);

        let rows = sqlx::query(
            "SELECT id::text AS id, filename, content,
                    1 - (embedding <=> $1::vector) AS similarity
             FROM documents
             WHERE embedding IS NOT NULL AND embedding_model = $2
             ORDER BY embedding <=> $1::vector
             LIMIT $3",
        )
        .bind(&literal)
        .bind(model_id)
        .bind(top_k as i64)
        .fetch_all(&self.pool)
        .await?;

        debug!("pgvector query for {model_id} returned {} rows", rows.len());

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let similarity: f64 = row.try_get("similarity")?;
            hits.push(DocumentHit {
                id: row.try_get("id")?,
                filename: row.try_get("filename")?,
                content: row.try_get("content")?,
                similarity: similarity as f32,
            });
        }

        Ok(hits)
    }
}
