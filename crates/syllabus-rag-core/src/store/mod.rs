//! Storage abstractions for the pipeline.
//!
//! Three seams, each with an in-memory implementation in [`memory`] for
//! tests and offline use:
//!
//! | Trait | External collaborator |
//! |-------|-----------------------|
//! | [`VectorStore`] | similarity-search service (e.g. Pinecone) |
//! | [`DocumentStore`] | raw document persistence |
//! | [`InteractionLog`] | append-only prompt/answer log |
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{RagError, Result};
use crate::models::{Document, Interaction, QueryMatch, VectorRecord};

/// Namespaced vector upsert and similarity query.
///
/// # Contract
///
/// - `upsert` is idempotent per id: an existing id within the namespace
///   has its vector and metadata replaced, never duplicated.
/// - `query` returns at most `top_k` matches sorted by non-increasing
///   score. An empty or unknown namespace yields an empty list.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<()>;

    async fn query(&self, namespace: &str, vector: &[f32], top_k: usize)
        -> Result<Vec<QueryMatch>>;
}

/// Persistence for source documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store a new document, stamping it with the current time.
    async fn create(&self, title: &str, content: &str) -> Result<Document>;

    /// The document with the greatest upload timestamp, if any.
    async fn latest(&self) -> Result<Option<Document>>;
}

/// Append-only log of answered prompts.
#[async_trait]
pub trait InteractionLog: Send + Sync {
    async fn append(
        &self,
        user_ref: &str,
        prompt: &str,
        reply: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Interaction>;

    /// All interactions for a user in the order they were written.
    async fn list_by_user(&self, user_ref: &str) -> Result<Vec<Interaction>>;
}

/// Reject a non-positive `top_k` before any backend call.
pub fn validate_top_k(top_k: usize) -> Result<()> {
    if top_k == 0 {
        return Err(RagError::validation("top_k must be > 0"));
    }
    Ok(())
}

/// Sort matches by descending score and keep at most `top_k`.
///
/// Backends that already rank their results still pass through here so the
/// ordering and size bound hold even if the remote service misbehaves.
/// NaN scores rank last.
pub fn rank_matches(mut matches: Vec<QueryMatch>, top_k: usize) -> Vec<QueryMatch> {
    matches.sort_by(|a, b| rank_key(b.score).total_cmp(&rank_key(a.score)));
    matches.truncate(top_k);
    matches
}

fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}
