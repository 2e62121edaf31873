//! Corpus index: semantic nearest-neighbor retrieval over ingested
//! contract documents.
//!
//! [`CorpusIndex`] is the seam between context assembly and the
//! storage/embedding backend; [`SqliteIndex`] is the production
//! implementation, ranking documents by cosine similarity between the
//! embedded question and the embedding BLOBs stored at ingestion time.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::config::EmbeddingConfig;
use crate::embedding;
use crate::models::{MetadataSummary, RetrievedDocument};

/// Nearest-neighbor retrieval over the ingested corpus.
#[async_trait]
pub trait CorpusIndex: Send + Sync {
    /// Return up to `k` documents ranked by similarity to `text`.
    async fn semantic_query(&self, text: &str, k: usize) -> Result<Vec<RetrievedDocument>>;

    /// True when no documents have been ingested.
    async fn is_empty(&self) -> Result<bool>;
}

/// SQLite-backed corpus index.
pub struct SqliteIndex {
    pool: SqlitePool,
    embedding: EmbeddingConfig,
}

impl SqliteIndex {
    pub fn new(pool: SqlitePool, embedding: EmbeddingConfig) -> Self {
        Self { pool, embedding }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Load the full metadata collection in ingestion order.
    pub async fn load_metadata(&self) -> Result<Vec<MetadataSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT store_name, cnpj, contract_number, store_area,
                   contract_start, contract_end, floor, store_number
            FROM documents
            ORDER BY position ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_metadata).collect())
    }
}

fn row_to_metadata(row: &sqlx::sqlite::SqliteRow) -> MetadataSummary {
    MetadataSummary {
        store_name: row.get("store_name"),
        cnpj: row.get("cnpj"),
        contract_number: row.get("contract_number"),
        store_area: row.get("store_area"),
        contract_start: row.get("contract_start"),
        contract_end: row.get("contract_end"),
        floor: row.get("floor"),
        store_number: row.get("store_number"),
    }
}

#[async_trait]
impl CorpusIndex for SqliteIndex {
    async fn semantic_query(&self, text: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
        if k == 0 || self.is_empty().await? {
            return Ok(Vec::new());
        }

        let query_vec = embedding::embed_query(&self.embedding, text).await?;

        let rows = sqlx::query(
            r#"
            SELECT id, position, body, embedding,
                   store_name, cnpj, contract_number, store_area,
                   contract_start, contract_end, floor, store_number
            FROM documents
            WHERE embedding IS NOT NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut candidates: Vec<(i64, RetrievedDocument)> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let doc_vec = embedding::blob_to_vec(&blob);
                let score = embedding::cosine_similarity(&query_vec, &doc_vec) as f64;
                let position: i64 = row.get("position");
                (
                    position,
                    RetrievedDocument {
                        id: row.get("id"),
                        text: row.get("body"),
                        metadata: row_to_metadata(row),
                        score,
                    },
                )
            })
            .collect();

        // Rank by similarity; ingestion order breaks ties deterministically.
        candidates.sort_by(|a, b| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        candidates.truncate(k);

        Ok(candidates.into_iter().map(|(_, doc)| doc).collect())
    }

    async fn is_empty(&self) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(count == 0)
    }
}
