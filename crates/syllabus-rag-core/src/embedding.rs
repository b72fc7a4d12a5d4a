//! Embedding provider trait and the order-preserving batch client.
//!
//! [`Embedder`] is the seam to the external embedding service; concrete
//! providers (OpenAI, Ollama) live in the application crate.
//! [`EmbeddingClient`] sits on top of an embedder and guarantees that
//! `output[i]` corresponds to `texts[i]`, splitting large inputs into
//! provider-sized sub-batches and reassembling them by index.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;

use crate::error::{RagError, Result};
use crate::models::EmbeddingVector;

/// Trait for embedding providers.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-ada-002"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding dimensionality, or `0` if not known up front.
    fn dims(&self) -> usize;

    /// Embed one request's worth of texts, one vector per input, same order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Order-preserving batch embedding over an [`Embedder`].
#[derive(Clone)]
pub struct EmbeddingClient {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    max_concurrency: usize,
}

impl EmbeddingClient {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize, max_concurrency: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Embed `texts`, returning exactly one vector per text in input order.
    ///
    /// Sub-batches may run concurrently (up to `max_concurrency`), but
    /// results are always reassembled by sub-batch position, never by
    /// arrival order. No retries happen here.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batches: Vec<&[String]> = texts.chunks(self.batch_size).collect();
        debug!(
            inputs = texts.len(),
            batches = batches.len(),
            model = self.model_name(),
            "embedding batch"
        );

        let results: Vec<Vec<Vec<f32>>> = stream::iter(batches)
            .map(|batch| self.embed_one(batch))
            .buffered(self.max_concurrency)
            .try_collect()
            .await?;

        let model = self.model_name().to_string();
        Ok(results
            .into_iter()
            .flatten()
            .map(|values| EmbeddingVector {
                model: model.clone(),
                values,
            })
            .collect())
    }

    /// Convenience wrapper for a single text (e.g. a user prompt).
    pub async fn embed_one_text(&self, text: &str) -> Result<EmbeddingVector> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::integrity("empty embedding response"))
    }

    async fn embed_one(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.embedder.embed(batch).await?;
        if vectors.len() != batch.len() {
            return Err(RagError::integrity(format!(
                "{} returned {} embeddings for {} inputs",
                self.model_name(),
                vectors.len(),
                batch.len()
            )));
        }
        let dims = self.embedder.dims();
        if dims > 0 {
            if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
                return Err(RagError::integrity(format!(
                    "{} returned a {}-dimensional vector, expected {}",
                    self.model_name(),
                    bad.len(),
                    dims
                )));
            }
        }
        Ok(vectors)
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors or
/// vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
