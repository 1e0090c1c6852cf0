//! Content Store: classified text chunks with nearest-neighbor retrieval
//!
//! Backed by Postgres + pgvector. The store owns the embedding client and
//! embeds both documents (at ingest) and query strings (at retrieval).
//! Concurrent reads are safe; `add_chunks` assumes a single writer at a
//! time (one ingestion process), which callers must arrange externally.

use crate::db::models::{ChunkColumn, ChunkEntity};
use crate::db::DbPool;
use crate::embeddings::Embedder;
use crate::errors::Result;
use crate::models::{ContentType, Difficulty, NewChunk, ScoredChunk};
use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, DbBackend, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, Statement, TransactionTrait, Value,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Row cap for the sampled aggregation in [`ContentStore::stats`].
///
/// Grouped counts are computed over at most this many rows, so on large
/// stores they describe a sample, not the full population. The total chunk
/// count is always exact.
pub const STATS_SAMPLE_LIMIT: u64 = 1000;

/// Attribute filters for a store query. Present fields combine with AND.
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    /// Exact class (grade) match
    pub class_num: Option<i32>,

    /// Exact subject match
    pub subject: Option<String>,

    /// Case-insensitive substring match on the topic label
    pub topic: Option<String>,

    /// Set membership over content types
    pub content_type: Option<Vec<ContentType>>,

    /// Exact difficulty match
    pub difficulty: Option<Difficulty>,

    /// Case-insensitive substring match on the chapter label
    pub chapter: Option<String>,
}

/// Aggregate statistics over the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    /// Exact total row count
    pub total_chunks: u64,

    /// Number of rows the grouped counts below were computed from
    pub sampled: usize,

    pub by_class: BTreeMap<String, u64>,
    pub by_subject: BTreeMap<String, u64>,
    pub by_content_type: BTreeMap<String, u64>,
    pub by_difficulty: BTreeMap<String, u64>,
}

/// Read-side contract of the store, split out so the generation pipeline
/// can run against an in-memory fake in tests.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// Return up to `limit` chunks nearest to `text` in embedding space,
    /// restricted by `filters`. No matching rows yields an empty vec,
    /// not an error.
    async fn query(
        &self,
        text: &str,
        filters: &QueryFilters,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>>;
}

/// The pgvector-backed content store
#[derive(Clone)]
pub struct ContentStore {
    pool: DbPool,
    embedder: Arc<dyn Embedder>,
}

impl ContentStore {
    pub fn new(pool: DbPool, embedder: Arc<dyn Embedder>) -> Self {
        Self { pool, embedder }
    }

    /// Get-or-create the backing schema: the pgvector extension, the chunk
    /// table sized to the embedder's dimension, and the similarity index.
    pub async fn ensure_schema(&self) -> Result<()> {
        let dim = self.embedder.dimension();

        self.pool
            .write()
            .execute_unprepared("CREATE EXTENSION IF NOT EXISTS vector")
            .await?;

        let create_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                class_num INTEGER NOT NULL,
                subject TEXT NOT NULL,
                chapter TEXT NOT NULL,
                topic TEXT NOT NULL,
                content_type TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                source_file TEXT NOT NULL,
                page INTEGER NOT NULL,
                paragraph_index INTEGER NOT NULL,
                embedding vector({dim}),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#
        );
        self.pool.write().execute_unprepared(&create_table).await?;

        self.pool
            .write()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS chunks_embedding_idx \
                 ON chunks USING hnsw (embedding vector_cosine_ops)",
            )
            .await?;

        info!(dimension = dim, "Content store schema ready");
        Ok(())
    }

    /// Add chunks in batches. Each chunk gets a content-derived identifier
    /// `{source_stem}_{ingest_timestamp}_{batch_offset}_{content_hash8}`,
    /// unique across repeated ingestion of the same file and across chunks
    /// with identical text (the 8-hex-char hash suffix makes collisions
    /// improbable, not impossible).
    ///
    /// A batch that fails to embed or insert is logged and skipped, not
    /// retried; the returned count may be less than `chunks.len()`.
    /// Partial success is the designed behavior, not an error.
    pub async fn add_chunks(&self, chunks: &[NewChunk], batch_size: usize) -> Result<usize> {
        info!(
            count = chunks.len(),
            batch_size, "Adding chunks to content store"
        );

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let batch_size = batch_size.max(1);
        let mut total_added = 0usize;

        for (batch_start, batch) in (0..chunks.len())
            .step_by(batch_size)
            .map(|i| (i, &chunks[i..(i + batch_size).min(chunks.len())]))
        {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();

            let embeddings = match self.embedder.embed_batch(&texts).await {
                Ok(e) => e,
                Err(e) => {
                    warn!(
                        batch_start,
                        batch_len = batch.len(),
                        error = %e,
                        "Failed to embed batch, skipping"
                    );
                    continue;
                }
            };

            let txn = self.pool.write().begin().await?;
            let mut batch_err = None;

            for (offset, (chunk, embedding)) in batch.iter().zip(embeddings.iter()).enumerate() {
                let id = chunk_id(
                    &chunk.metadata.source_file,
                    &timestamp,
                    batch_start + offset,
                    &chunk.content,
                );

                if let Err(e) = insert_chunk(&txn, &id, chunk, embedding).await {
                    batch_err = Some(e);
                    break;
                }
            }

            match batch_err {
                None => {
                    txn.commit().await?;
                    total_added += batch.len();
                }
                Some(e) => {
                    let _ = txn.rollback().await;
                    warn!(
                        batch_start,
                        batch_len = batch.len(),
                        error = %e,
                        "Failed to insert batch, skipping"
                    );
                    continue;
                }
            }

            if (batch_start + batch_size) % 500 == 0 {
                info!(
                    added = total_added,
                    total = chunks.len(),
                    "Ingestion progress"
                );
            }
        }

        info!(added = total_added, "Chunks added to content store");
        Ok(total_added)
    }

    /// Bulk-remove chunks by id. Returns the number of rows deleted.
    pub async fn delete(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = ChunkEntity::delete_many()
            .filter(ChunkColumn::Id.is_in(ids.iter().cloned()))
            .exec(self.pool.write())
            .await?;

        info!(deleted = result.rows_affected, "Chunks deleted");
        Ok(result.rows_affected)
    }

    /// Remove every chunk. Destructive and irreversible.
    pub async fn reset(&self) -> Result<()> {
        self.pool
            .write()
            .execute_unprepared("TRUNCATE TABLE chunks")
            .await?;

        info!("Content store reset");
        Ok(())
    }

    /// Aggregate statistics: exact total count plus grouped counts over a
    /// bounded sample of [`STATS_SAMPLE_LIMIT`] rows (see the constant for
    /// the sampling caveat).
    pub async fn stats(&self) -> Result<StoreStats> {
        let total_chunks = ChunkEntity::find().count(self.pool.read()).await?;

        let sample = ChunkEntity::find()
            .limit(STATS_SAMPLE_LIMIT)
            .all(self.pool.read())
            .await?;

        let mut by_class = BTreeMap::new();
        let mut by_subject = BTreeMap::new();
        let mut by_content_type = BTreeMap::new();
        let mut by_difficulty = BTreeMap::new();

        for row in &sample {
            *by_class.entry(row.class_num.to_string()).or_insert(0) += 1;
            *by_subject.entry(row.subject.clone()).or_insert(0) += 1;
            *by_content_type.entry(row.content_type.clone()).or_insert(0) += 1;
            *by_difficulty.entry(row.difficulty.clone()).or_insert(0) += 1;
        }

        Ok(StoreStats {
            total_chunks,
            sampled: sample.len(),
            by_class,
            by_subject,
            by_content_type,
            by_difficulty,
        })
    }
}

#[async_trait]
impl ChunkSource for ContentStore {
    async fn query(
        &self,
        text: &str,
        filters: &QueryFilters,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let embedding = self.embedder.embed(text).await?;
        let embedding_str = embedding_to_pg(&embedding);

        // $1 = query vector, $2 = limit, filters start at $3
        let (clauses, filter_values) = build_filter_clauses(filters, 3);

        let where_filters = if clauses.is_empty() {
            String::new()
        } else {
            format!("AND {}", clauses.join(" AND "))
        };

        let sql = format!(
            r#"
            SELECT
                id, content, class_num, subject, chapter, topic,
                content_type, difficulty, source_file, page, paragraph_index,
                (embedding <=> $1::vector) as distance
            FROM chunks
            WHERE embedding IS NOT NULL
            {}
            ORDER BY embedding <=> $1::vector
            LIMIT $2
            "#,
            where_filters
        );

        let mut values: Vec<Value> = vec![embedding_str.into(), (limit as i64).into()];
        values.extend(filter_values);

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, values);

        let results: Vec<ScoredChunk> = self
            .pool
            .read()
            .query_all(stmt)
            .await?
            .into_iter()
            .filter_map(|row| {
                Some(ScoredChunk {
                    id: row.try_get_by_index::<String>(0).ok()?,
                    content: row.try_get_by_index::<String>(1).ok()?,
                    metadata: crate::models::ChunkMetadata {
                        class_num: row.try_get_by_index::<i32>(2).ok()?,
                        subject: row.try_get_by_index::<String>(3).ok()?,
                        chapter: row.try_get_by_index::<String>(4).ok()?,
                        topic: row.try_get_by_index::<String>(5).ok()?,
                        content_type: row
                            .try_get_by_index::<String>(6)
                            .ok()?
                            .parse()
                            .unwrap_or_default(),
                        difficulty: row
                            .try_get_by_index::<String>(7)
                            .ok()?
                            .parse()
                            .unwrap_or_default(),
                        source_file: row.try_get_by_index::<String>(8).ok()?,
                        page: row.try_get_by_index::<i32>(9).ok()?,
                        paragraph_index: row.try_get_by_index::<i32>(10).ok()?,
                    },
                    distance: row.try_get_by_index::<f64>(11).ok()?,
                })
            })
            .collect();

        tracing::debug!(
            query = text,
            results = results.len(),
            limit,
            "Store query complete"
        );

        Ok(results)
    }
}

async fn insert_chunk(
    txn: &DatabaseTransaction,
    id: &str,
    chunk: &NewChunk,
    embedding: &[f32],
) -> Result<()> {
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"
        INSERT INTO chunks (
            id, content, class_num, subject, chapter, topic,
            content_type, difficulty, source_file, page, paragraph_index,
            embedding, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12::vector, NOW())
        "#,
        vec![
            id.into(),
            chunk.content.clone().into(),
            chunk.metadata.class_num.into(),
            chunk.metadata.subject.clone().into(),
            chunk.metadata.chapter.clone().into(),
            chunk.metadata.topic.clone().into(),
            chunk.metadata.content_type.as_str().into(),
            chunk.metadata.difficulty.as_str().into(),
            chunk.metadata.source_file.clone().into(),
            chunk.metadata.page.into(),
            chunk.metadata.paragraph_index.into(),
            embedding_to_pg(embedding).into(),
        ],
    );

    txn.execute(stmt).await?;
    Ok(())
}

/// Content-derived chunk identifier:
/// `{source_stem}_{ingest_timestamp}_{batch_offset}_{content_hash8}`.
fn chunk_id(source_file: &str, timestamp: &str, offset: usize, content: &str) -> String {
    let stem = Path::new(source_file)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let digest = Sha256::digest(content.as_bytes());
    let hash8 = &hex::encode(digest)[..8];

    format!("{}_{}_{}_{}", stem, timestamp, offset, hash8)
}

/// Convert an embedding to the pgvector text format "[1.0,2.0,...]"
fn embedding_to_pg(embedding: &[f32]) -> String {
    format!(
        "[{}]",
        embedding
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(",")
    )
}

/// Render the optional filters as SQL conditions with positional
/// placeholders starting at `first_param`. Present filters AND together.
fn build_filter_clauses(filters: &QueryFilters, first_param: usize) -> (Vec<String>, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    let mut param = first_param;

    if let Some(class_num) = filters.class_num {
        clauses.push(format!("class_num = ${}", param));
        values.push(class_num.into());
        param += 1;
    }

    if let Some(ref subject) = filters.subject {
        clauses.push(format!("subject = ${}", param));
        values.push(subject.clone().into());
        param += 1;
    }

    if let Some(ref topic) = filters.topic {
        clauses.push(format!("topic ILIKE ${}", param));
        values.push(format!("%{}%", topic).into());
        param += 1;
    }

    if let Some(ref content_types) = filters.content_type {
        if !content_types.is_empty() {
            let placeholders: Vec<String> = content_types
                .iter()
                .enumerate()
                .map(|(i, _)| format!("${}", param + i))
                .collect();
            clauses.push(format!("content_type IN ({})", placeholders.join(", ")));
            for ct in content_types {
                values.push(ct.as_str().into());
            }
            param += content_types.len();
        }
    }

    if let Some(difficulty) = filters.difficulty {
        clauses.push(format!("difficulty = ${}", param));
        values.push(difficulty.as_str().into());
        param += 1;
    }

    if let Some(ref chapter) = filters.chapter {
        clauses.push(format!("chapter ILIKE ${}", param));
        values.push(format!("%{}%", chapter).into());
    }

    (clauses, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_shape() {
        let id = chunk_id("uploads/8_Math_algebra.pdf", "20260806_120000", 12, "x = y + z");
        let parts: Vec<&str> = id.split('_').collect();
        // stem itself contains underscores; check prefix and suffix shape
        assert!(id.starts_with("8_Math_algebra_20260806_120000_12_"));
        assert_eq!(parts.last().unwrap().len(), 8);
    }

    #[test]
    fn test_chunk_id_distinguishes_content() {
        let a = chunk_id("book.pdf", "20260806_120000", 0, "first passage");
        let b = chunk_id("book.pdf", "20260806_120000", 0, "second passage");
        assert_ne!(a, b);
    }

    #[test]
    fn test_chunk_id_empty_source_falls_back() {
        let id = chunk_id("", "20260806_120000", 3, "text");
        assert!(id.starts_with("unknown_"));
    }

    #[test]
    fn test_embedding_to_pg_format() {
        assert_eq!(embedding_to_pg(&[1.0, 2.5, -0.5]), "[1,2.5,-0.5]");
    }

    #[test]
    fn test_filter_clauses_empty() {
        let (clauses, values) = build_filter_clauses(&QueryFilters::default(), 3);
        assert!(clauses.is_empty());
        assert!(values.is_empty());
    }

    #[test]
    fn test_filter_clauses_combine_with_and_semantics() {
        let filters = QueryFilters {
            class_num: Some(6),
            subject: Some("Science".into()),
            topic: Some("Temperature".into()),
            content_type: Some(vec![ContentType::Definition, ContentType::Formula]),
            difficulty: Some(Difficulty::Easy),
            chapter: Some("Heat".into()),
        };

        let (clauses, values) = build_filter_clauses(&filters, 3);

        assert_eq!(clauses.len(), 6);
        assert_eq!(values.len(), 7); // two values for the content-type set
        assert_eq!(clauses[0], "class_num = $3");
        assert_eq!(clauses[1], "subject = $4");
        assert_eq!(clauses[2], "topic ILIKE $5");
        assert_eq!(clauses[3], "content_type IN ($6, $7)");
        assert_eq!(clauses[4], "difficulty = $8");
        assert_eq!(clauses[5], "chapter ILIKE $9");
    }

    #[test]
    fn test_filter_substring_values_are_wrapped() {
        let filters = QueryFilters {
            topic: Some("Algebra".into()),
            ..Default::default()
        };
        let (_, values) = build_filter_clauses(&filters, 3);
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], Value::from("%Algebra%"));
    }
}
