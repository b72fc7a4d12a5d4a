//! In-memory store implementations for testing and offline runs.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.
//! Vector search is brute-force cosine similarity over the namespace.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::embedding::cosine_similarity;
use crate::error::{RagError, Result};
use crate::models::{Document, Interaction, QueryMatch, VectorRecord};

use super::{rank_matches, validate_top_k, DocumentStore, InteractionLog, VectorStore};

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| RagError::storage("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| RagError::storage("in-memory store lock poisoned"))
}

/// In-memory vector store keyed by namespace, then record id.
#[derive(Default)]
pub struct InMemoryVectorStore {
    namespaces: RwLock<HashMap<String, Vec<VectorRecord>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held in `namespace`.
    pub fn len(&self, namespace: &str) -> usize {
        read(&self.namespaces)
            .map(|ns| ns.get(namespace).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<()> {
        let mut namespaces = write(&self.namespaces)?;
        let stored = namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            match stored.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => stored.push(record.clone()),
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<QueryMatch>> {
        validate_top_k(top_k)?;
        let namespaces = read(&self.namespaces)?;
        let Some(stored) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };
        let matches = stored
            .iter()
            .map(|r| QueryMatch {
                id: r.id.clone(),
                score: cosine_similarity(vector, &r.values),
                metadata: r.metadata.clone(),
            })
            .collect();
        Ok(rank_matches(matches, top_k))
    }
}

/// In-memory document store. Later inserts win timestamp ties.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    docs: RwLock<Vec<Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, title: &str, content: &str) -> Result<Document> {
        let doc = Document {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            uploaded_at: Utc::now(),
        };
        write(&self.docs)?.push(doc.clone());
        Ok(doc)
    }

    async fn latest(&self) -> Result<Option<Document>> {
        let docs = read(&self.docs)?;
        // max_by_key keeps the last maximum, so ties go to the newest insert
        Ok(docs.iter().max_by_key(|d| d.uploaded_at).cloned())
    }
}

/// In-memory interaction log.
#[derive(Default)]
pub struct InMemoryInteractionLog {
    entries: RwLock<Vec<Interaction>>,
}

impl InMemoryInteractionLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InteractionLog for InMemoryInteractionLog {
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
        write(&self.entries)?.push(interaction.clone());
        Ok(interaction)
    }

    async fn list_by_user(&self, user_ref: &str) -> Result<Vec<Interaction>> {
        Ok(read(&self.entries)?
            .iter()
            .filter(|i| i.user_ref == user_ref)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordMetadata;

    fn record(id: &str, values: Vec<f32>, text: &str) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            values,
            metadata: RecordMetadata::text_only(text),
        }
    }

    #[tokio::test]
    async fn test_query_empty_namespace_returns_empty() {
        let store = InMemoryVectorStore::new();
        let hits = store.query("syllabus", &[1.0, 0.0], 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_query_zero_top_k_rejected() {
        let store = InMemoryVectorStore::new();
        let err = store.query("syllabus", &[1.0], 0).await.unwrap_err();
        assert!(matches!(err, RagError::Validation(_)));
    }

    #[tokio::test]
    async fn test_upsert_same_id_overwrites() {
        let store = InMemoryVectorStore::new();
        store
            .upsert("syllabus", &[record("r1", vec![1.0, 0.0], "old")])
            .await
            .unwrap();
        store
            .upsert("syllabus", &[record("r1", vec![0.0, 1.0], "new")])
            .await
            .unwrap();
        assert_eq!(store.len("syllabus"), 1);

        let hits = store.query("syllabus", &[0.0, 1.0], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.text, "new");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_query_sorted_and_bounded() {
        let store = InMemoryVectorStore::new();
        let records: Vec<VectorRecord> = (0..10)
            .map(|i| record(&format!("r{}", i), vec![1.0, i as f32], &format!("t{}", i)))
            .collect();
        store.upsert("syllabus", &records).await.unwrap();

        let hits = store.query("syllabus", &[0.0, 1.0], 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(hits[0].id, "r9");
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let store = InMemoryVectorStore::new();
        store
            .upsert("a", &[record("r1", vec![1.0], "in a")])
            .await
            .unwrap();
        assert!(store.query("b", &[1.0], 5).await.unwrap().is_empty());
        assert_eq!(store.query("a", &[1.0], 5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_latest_document() {
        let docs = InMemoryDocumentStore::new();
        assert!(docs.latest().await.unwrap().is_none());
        docs.create("first", "one").await.unwrap();
        let second = docs.create("second", "two").await.unwrap();
        assert_eq!(docs.latest().await.unwrap().unwrap().id, second.id);
    }

    #[tokio::test]
    async fn test_interaction_log_filters_by_user() {
        let log = InMemoryInteractionLog::new();
        log.append("u1", "what is algebra", "a", Utc::now())
            .await
            .unwrap();
        log.append("u2", "what is calculus", "b", Utc::now())
            .await
            .unwrap();
        log.append("u1", "geometry?", "c", Utc::now()).await.unwrap();

        let mine = log.list_by_user("u1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].prompt, "what is algebra");
        assert_eq!(mine[1].prompt, "geometry?");
    }
}
