//! SQLite-backed [`DocumentStore`], [`InteractionLog`], and [`VectorStore`].
//!
//! Timestamps are stored as Unix milliseconds. Ties on the timestamp are
//! broken by `rowid`, so "latest" and "in write order" stay well defined
//! when two rows land in the same millisecond.
//!
//! Vectors are little-endian `f32` BLOBs; queries are brute-force cosine
//! similarity over one namespace.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use syllabus_rag_core::embedding::cosine_similarity;
use syllabus_rag_core::models::{Document, Interaction, QueryMatch, RecordMetadata, VectorRecord};
use syllabus_rag_core::store::{rank_matches, validate_top_k, DocumentStore, InteractionLog, VectorStore};
use syllabus_rag_core::{RagError, Result};

fn storage_err(e: sqlx::Error) -> RagError {
    RagError::storage(e.to_string())
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| RagError::storage(format!("invalid timestamp in database: {}", ms)))
}

/// Encode a vector as little-endian bytes.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a little-endian BLOB; a trailing partial value is dropped.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn create(&self, title: &str, content: &str) -> Result<Document> {
        let doc = Document {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            uploaded_at: Utc::now(),
        };

        sqlx::query("INSERT INTO documents (id, title, content, uploaded_at) VALUES (?, ?, ?, ?)")
            .bind(&doc.id)
            .bind(&doc.title)
            .bind(&doc.content)
            .bind(doc.uploaded_at.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(doc)
    }

    async fn latest(&self) -> Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, title, content, uploaded_at FROM documents
             ORDER BY uploaded_at DESC, rowid DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        match row {
            Some(row) => Ok(Some(Document {
                id: row.get("id"),
                title: row.get("title"),
                content: row.get("content"),
                uploaded_at: from_millis(row.get("uploaded_at"))?,
            })),
            None => Ok(None),
        }
    }
}

pub struct SqliteInteractionLog {
    pool: SqlitePool,
}

impl SqliteInteractionLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InteractionLog for SqliteInteractionLog {
    async fn append(
        &self,
        user_ref: &str,
        prompt: &str,
        reply: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Interaction> {
        let interaction = Interaction {
            id: Uuid::new_v4().to_string(),
            user_ref: user_ref.to_string(),
            prompt: prompt.to_string(),
            reply: reply.to_string(),
            timestamp,
        };

        sqlx::query(
            "INSERT INTO interactions (id, user_ref, prompt, reply, timestamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&interaction.id)
        .bind(&interaction.user_ref)
        .bind(&interaction.prompt)
        .bind(&interaction.reply)
        .bind(interaction.timestamp.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(interaction)
    }

    async fn list_by_user(&self, user_ref: &str) -> Result<Vec<Interaction>> {
        let rows = sqlx::query(
            "SELECT id, user_ref, prompt, reply, timestamp FROM interactions
             WHERE user_ref = ? ORDER BY timestamp ASC, rowid ASC",
        )
        .bind(user_ref)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.into_iter()
            .map(|row| {
                Ok(Interaction {
                    id: row.get("id"),
                    user_ref: row.get("user_ref"),
                    prompt: row.get("prompt"),
                    reply: row.get("reply"),
                    timestamp: from_millis(row.get("timestamp"))?,
                })
            })
            .collect()
    }
}

pub struct SqliteVectorStore {
    pool: SqlitePool,
}

impl SqliteVectorStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        for record in records {
            let metadata = serde_json::to_string(&record.metadata)
                .map_err(|e| RagError::storage(format!("failed to encode metadata: {}", e)))?;

            sqlx::query(
                "INSERT INTO vectors (namespace, id, dims, embedding, metadata)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(namespace, id) DO UPDATE SET
                    dims = excluded.dims,
                    embedding = excluded.embedding,
                    metadata = excluded.metadata",
            )
            .bind(namespace)
            .bind(&record.id)
            .bind(record.values.len() as i64)
            .bind(vec_to_blob(&record.values))
            .bind(metadata)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        }

        tx.commit().await.map_err(storage_err)?;
        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<QueryMatch>> {
        validate_top_k(top_k)?;

        let rows = sqlx::query("SELECT id, embedding, metadata FROM vectors WHERE namespace = ?")
            .bind(namespace)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        let mut matches = Vec::with_capacity(rows.len());
        for row in rows {
            let blob: Vec<u8> = row.get("embedding");
            let metadata: String = row.get("metadata");
            let metadata: RecordMetadata = serde_json::from_str(&metadata)
                .map_err(|e| RagError::storage(format!("corrupt metadata: {}", e)))?;
            matches.push(QueryMatch {
                id: row.get("id"),
                score: cosine_similarity(vector, &blob_to_vec(&blob)),
                metadata,
            });
        }

        Ok(rank_matches(matches, top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, migrate};
    use tempfile::TempDir;

    async fn setup() -> (TempDir, SqlitePool) {
        let tmp = TempDir::new().unwrap();
        let pool = db::connect_path(&tmp.path().join("data/test.sqlite"))
            .await
            .unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        (tmp, pool)
    }

    #[tokio::test]
    async fn test_latest_document_roundtrip() {
        let (_tmp, pool) = setup().await;
        let store = SqliteDocumentStore::new(pool);

        assert!(store.latest().await.unwrap().is_none());
        store.create("Week 1", "limits").await.unwrap();
        let second = store.create("Week 2", "derivatives\n\nand rules").await.unwrap();

        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.content, "derivatives\n\nand rules");
        assert_eq!(
            latest.uploaded_at.timestamp_millis(),
            second.uploaded_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_interactions_listed_in_write_order() {
        let (_tmp, pool) = setup().await;
        let log = SqliteInteractionLog::new(pool);
        let ts = Utc::now();

        log.append("u1", "algebra?", "yes", ts).await.unwrap();
        log.append("u2", "calculus?", "no", ts).await.unwrap();
        log.append("u1", "geometry?", "maybe", ts).await.unwrap();

        let mine = log.list_by_user("u1").await.unwrap();
        let prompts: Vec<&str> = mine.iter().map(|i| i.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["algebra?", "geometry?"]);
        assert!(log.list_by_user("nobody").await.unwrap().is_empty());
    }

    fn record(id: &str, values: Vec<f32>, text: &str) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            values,
            metadata: RecordMetadata {
                text: text.to_string(),
                document_id: Some("doc".to_string()),
                chunk_index: Some(0),
            },
        }
    }

    #[test]
    fn test_vec_blob_roundtrip() {
        let v = vec![1.0f32, -2.5, 3.125];
        let blob = vec_to_blob(&v);
        assert_eq!(blob.len(), 12);
        assert_eq!(blob_to_vec(&blob), v);
    }

    #[tokio::test]
    async fn test_vector_upsert_replaces_by_id() {
        let (_tmp, pool) = setup().await;
        let store = SqliteVectorStore::new(pool.clone());

        store
            .upsert("syllabus", &[record("a", vec![1.0, 0.0], "old")])
            .await
            .unwrap();
        store
            .upsert("syllabus", &[record("a", vec![0.0, 1.0], "new")])
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vectors")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let hits = store.query("syllabus", &[0.0, 1.0], 5).await.unwrap();
        assert_eq!(hits[0].metadata.text, "new");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_vector_query_ranked_bounded_and_namespaced() {
        let (_tmp, pool) = setup().await;
        let store = SqliteVectorStore::new(pool);

        store
            .upsert(
                "syllabus",
                &[
                    record("x", vec![1.0, 0.0], "x"),
                    record("y", vec![0.7, 0.7], "y"),
                    record("z", vec![0.0, 1.0], "z"),
                ],
            )
            .await
            .unwrap();
        store
            .upsert("other", &[record("w", vec![1.0, 0.0], "w")])
            .await
            .unwrap();

        let hits = store.query("syllabus", &[1.0, 0.0], 2).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);

        assert!(store.query("empty", &[1.0, 0.0], 5).await.unwrap().is_empty());
        assert!(store.query("syllabus", &[1.0, 0.0], 0).await.is_err());
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let (_tmp, pool) = setup().await;
        migrate::run_migrations(&pool).await.unwrap();
    }
}
