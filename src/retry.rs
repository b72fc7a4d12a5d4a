//! Timeout and bounded retry around external calls.
//!
//! [`Resilient`] wraps any [`Embedder`] or [`Generator`] and applies a
//! [`RetryPolicy`] to every call. Stores that issue several requests per
//! call (Pinecone) use [`RetryPolicy::run`] per request instead.
//!
//! - each attempt is bounded by `timeout`; a timeout counts as a
//!   retryable provider error
//! - retryable errors (429, 5xx, network, timeout) are retried up to
//!   `max_retries` times
//! - anything else (4xx, validation, integrity) fails immediately
//! - backoff: `base`, `2 × base`, `4 × base`, … (exponent capped at 5)

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use syllabus_rag_core::embedding::Embedder;
use syllabus_rag_core::generation::{GenerationRequest, Generator};
use syllabus_rag_core::{RagError, Result};

use crate::config::ResilienceConfig;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * (1u32 << attempt.saturating_sub(1).min(5))
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(RagError::transient(
                    label,
                    format!("request timed out after {:?}", self.timeout),
                )),
            };

            match outcome {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "{} call failed; retrying",
                        label
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

/// Decorator adding [`RetryPolicy`] to an external-service handle.
pub struct Resilient<T: ?Sized> {
    inner: Arc<T>,
    policy: RetryPolicy,
}

impl<T: ?Sized> Resilient<T> {
    pub fn new(inner: Arc<T>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<T: Embedder + ?Sized> Embedder for Resilient<T> {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dims(&self) -> usize {
        self.inner.dims()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.policy
            .run(self.inner.model_name(), || self.inner.embed(texts))
            .await
    }
}

#[async_trait]
impl<T: Generator + ?Sized> Generator for Resilient<T> {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.policy
            .run(self.inner.model_name(), || self.inner.generate(request))
            .await
    }
}
