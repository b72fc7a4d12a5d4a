//! Knowledge-base build orchestration.
//!
//! Runs one document through chunking → embedding → vector upsert:
//!
//! 1. Split the content into fixed windows ([`crate::chunk`]).
//! 2. Embed every chunk in one [`EmbeddingClient::embed_batch`] call.
//! 3. Pair chunk *i* with vector *i* under a deterministic record id.
//! 4. Upsert all records into the configured namespace.
//!
//! Record ids depend only on the document id and chunk index, so
//! [`KnowledgeBaseBuilder::rebuild`] replaces records instead of
//! accumulating copies. A build that fails after some records reached the
//! vector store is not rolled back.

use std::sync::Arc;

use tracing::{info, warn};

use crate::chunk::chunk_document;
use crate::embedding::EmbeddingClient;
use crate::error::{RagError, Result};
use crate::models::{BuildReport, Document, RecordMetadata, VectorRecord};
use crate::store::{DocumentStore, VectorStore};

/// Build-time settings.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub max_chunk_size: usize,
    pub namespace: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            max_chunk_size: 500,
            namespace: "syllabus".to_string(),
        }
    }
}

pub struct KnowledgeBaseBuilder {
    embeddings: EmbeddingClient,
    vectors: Arc<dyn VectorStore>,
    documents: Arc<dyn DocumentStore>,
    settings: BuildSettings,
}

impl KnowledgeBaseBuilder {
    /// Reject a zero chunk size here so no build ever reaches a provider with it.
    pub fn new(
        embeddings: EmbeddingClient,
        vectors: Arc<dyn VectorStore>,
        documents: Arc<dyn DocumentStore>,
        settings: BuildSettings,
    ) -> Result<Self> {
        if settings.max_chunk_size == 0 {
            return Err(RagError::validation("max chunk size must be > 0"));
        }
        Ok(Self {
            embeddings,
            vectors,
            documents,
            settings,
        })
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// Index one document into the vector store.
    pub async fn build(&self, document: &Document) -> Result<BuildReport> {
        let chunks = chunk_document(document, self.settings.max_chunk_size)?;
        info!(
            document_id = %document.id,
            title = %document.title,
            chunks = chunks.len(),
            "building knowledge base"
        );

        if chunks.is_empty() {
            warn!(document_id = %document.id, "document has no content; nothing to index");
            return Ok(BuildReport {
                document_id: document.id.clone(),
                chunks: 0,
                embeddings: 0,
                records: 0,
            });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embeddings.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(RagError::integrity(format!(
                "received {} embeddings for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }
        let embedded = vectors.len();

        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| VectorRecord {
                id: chunk.id,
                values: vector.values,
                metadata: RecordMetadata {
                    text: chunk.text,
                    document_id: Some(chunk.document_id),
                    chunk_index: Some(chunk.chunk_index),
                },
            })
            .collect();

        self.vectors
            .upsert(&self.settings.namespace, &records)
            .await?;

        info!(
            document_id = %document.id,
            records = records.len(),
            namespace = %self.settings.namespace,
            "knowledge base updated"
        );

        Ok(BuildReport {
            document_id: document.id.clone(),
            chunks: records.len(),
            embeddings: embedded,
            records: records.len(),
        })
    }

    /// Store a new document and index it.
    ///
    /// Plain text only; converting uploaded files to text happens upstream.
    /// If indexing fails the document stays stored and can be rebuilt.
    pub async fn ingest(&self, title: &str, content: &str) -> Result<BuildReport> {
        let document = self.documents.create(title, content).await?;
        self.build(&document).await
    }

    /// Re-index the most recently uploaded document.
    pub async fn rebuild(&self) -> Result<BuildReport> {
        let document = self
            .documents
            .latest()
            .await?
            .ok_or_else(|| RagError::NotFound("no document has been uploaded".to_string()))?;
        self.build(&document).await
    }
}
