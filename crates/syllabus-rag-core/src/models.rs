//! Core data models that flow through the ingestion and answering pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored source document (e.g. the extracted text of a syllabus).
///
/// Content is immutable once stored; the document store owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A bounded slice of a document's text.
///
/// `document_id` is a plain reference to the source document; chunks are
/// transient values produced during a build and never persisted on their own.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Deterministic record id, see [`crate::chunk::record_id`].
    pub id: String,
    pub document_id: String,
    pub chunk_index: usize,
    pub text: String,
}

/// An embedding produced by a specific model.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector {
    pub model: String,
    pub values: Vec<f32>,
}

impl EmbeddingVector {
    pub fn dims(&self) -> usize {
        self.values.len()
    }
}

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Source chunk text; this is what retrieval feeds into the prompt.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
}

impl RecordMetadata {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            document_id: None,
            chunk_index: None,
        }
    }
}

/// A vector record as upserted into the vector store.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    /// Unique within a namespace; upserting an existing id overwrites it.
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// A ranked hit returned by a vector-store query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    pub metadata: RecordMetadata,
}

/// One logged prompt/answer exchange. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub user_ref: String,
    pub prompt: String,
    pub reply: String,
    pub timestamp: DateTime<Utc>,
}

/// Topic frequencies split into strengths and gaps. Derived, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub topic_count: BTreeMap<String, usize>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
}

/// Counts produced by one knowledge-base build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub document_id: String,
    pub chunks: usize,
    pub embeddings: usize,
    pub records: usize,
}

/// The result of answering a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// `false` when the interaction log rejected the append.
    pub logged: bool,
}
