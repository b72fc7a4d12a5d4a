//! Pinecone-backed [`VectorStore`].
//!
//! Talks to an index's data-plane host:
//!
//! - `POST {host}/vectors/upsert` with `{namespace, vectors: [{id, values, metadata}]}`
//! - `POST {host}/query` with `{namespace, vector, topK, includeMetadata: true}`
//!
//! Authentication is the `Api-Key` header, read from `PINECONE_API_KEY`.
//!
//! Upserts go out in slices of [`UPSERT_BATCH`]; the [`RetryPolicy`]
//! timeout and retries apply per request, not per upsert call.

use anyhow::bail;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use syllabus_rag_core::models::{QueryMatch, RecordMetadata, VectorRecord};
use syllabus_rag_core::store::{rank_matches, validate_top_k, VectorStore};
use syllabus_rag_core::{RagError, Result};

use crate::config::VectorStoreConfig;
use crate::http;
use crate::retry::RetryPolicy;

/// Pinecone caps upsert requests; larger record sets are sent in slices.
const UPSERT_BATCH: usize = 100;

pub struct PineconeVectorStore {
    host: String,
    api_key: String,
    client: reqwest::Client,
    policy: RetryPolicy,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a RecordMetadata,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    namespace: &'a str,
    vectors: Vec<UpsertVector<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<PineconeMatch>,
}

#[derive(Deserialize)]
struct PineconeMatch {
    id: String,
    score: f32,
    metadata: Option<RecordMetadata>,
}

impl PineconeVectorStore {
    pub fn new(config: &VectorStoreConfig, policy: RetryPolicy) -> anyhow::Result<Self> {
        let host = config
            .host
            .clone()
            .ok_or_else(|| anyhow::anyhow!("vector_store.host required for Pinecone provider"))?;

        let api_key = match std::env::var("PINECONE_API_KEY") {
            Ok(key) => key,
            Err(_) => bail!("PINECONE_API_KEY environment variable not set"),
        };

        Ok(Self::with_api_key(host, api_key, policy)?)
    }

    pub fn with_api_key(
        host: impl Into<String>,
        api_key: impl Into<String>,
        policy: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self {
            host: host.into(),
            api_key: api_key.into(),
            client: http::client()?,
            policy,
        })
    }

    async fn upsert_slice(&self, namespace: &str, slice: &[VectorRecord]) -> Result<()> {
        let body = UpsertRequest {
            namespace,
            vectors: slice
                .iter()
                .map(|r| UpsertVector {
                    id: &r.id,
                    values: &r.values,
                    metadata: &r.metadata,
                })
                .collect(),
        };

        let request = self
            .client
            .post(http::endpoint(&self.host, "/vectors/upsert"))
            .header("Api-Key", &self.api_key)
            .json(&body);

        let json = http::send_json("pinecone", request).await?;
        debug!(
            namespace,
            upserted = json.get("upsertedCount").and_then(|c| c.as_u64()),
            "pinecone upsert"
        );
        Ok(())
    }

    async fn query_once(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<QueryMatch>> {
        let body = QueryRequest {
            namespace,
            vector,
            top_k,
            include_metadata: true,
        };

        let request = self
            .client
            .post(http::endpoint(&self.host, "/query"))
            .header("Api-Key", &self.api_key)
            .json(&body);

        let json = http::send_json("pinecone", request).await?;
        parse_query_response(json, top_k)
    }
}

/// Timeout and retries apply to each HTTP request; a failed slice is
/// re-sent alone.
#[async_trait]
impl VectorStore for PineconeVectorStore {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<()> {
        for slice in records.chunks(UPSERT_BATCH) {
            self.policy
                .run("pinecone", || self.upsert_slice(namespace, slice))
                .await?;
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
        self.policy
            .run("pinecone", || self.query_once(namespace, vector, top_k))
            .await
    }
}

fn parse_query_response(json: serde_json::Value, top_k: usize) -> Result<Vec<QueryMatch>> {
    let response: QueryResponse = serde_json::from_value(json)
        .map_err(|e| RagError::provider("pinecone", format!("invalid query response: {}", e)))?;

    let matches = response
        .matches
        .into_iter()
        .map(|m| QueryMatch {
            id: m.id,
            score: m.score,
            metadata: m
                .metadata
                .unwrap_or_else(|| RecordMetadata::text_only(String::new())),
        })
        .collect();

    Ok(rank_matches(matches, top_k))
}
