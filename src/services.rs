//! Wiring from [`Config`] to the pipeline components.
//!
//! The embedder and generator are wrapped in [`Resilient`]; the Pinecone
//! store applies the same [`RetryPolicy`] to each of its HTTP requests.
//! Components are built lazily per command: `srag report` never needs
//! provider credentials.

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;

use syllabus_rag_core::analytics::{FrequencyTopicExtractor, KeywordTopicExtractor, TopicExtractor};
use syllabus_rag_core::builder::{BuildSettings, KnowledgeBaseBuilder};
use syllabus_rag_core::embedding::{EmbeddingClient, Embedder};
use syllabus_rag_core::generation::{Generator, SamplingParams};
use syllabus_rag_core::responder::{ResponderSettings, RetrievalAugmentedResponder};
use syllabus_rag_core::store::memory::InMemoryVectorStore;
use syllabus_rag_core::store::{DocumentStore, InteractionLog, VectorStore};

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::generation::create_generator;
use crate::pinecone::PineconeVectorStore;
use crate::retry::{Resilient, RetryPolicy};
use crate::sqlite_store::{SqliteDocumentStore, SqliteInteractionLog, SqliteVectorStore};

pub fn embedding_client(config: &Config) -> Result<EmbeddingClient> {
    let policy = RetryPolicy::from_config(&config.resilience);
    let embedder: Arc<dyn Embedder> =
        Arc::new(Resilient::new(create_embedder(&config.embedding)?, policy));
    Ok(EmbeddingClient::new(
        embedder,
        config.embedding.batch_size,
        config.embedding.max_concurrency,
    ))
}

pub fn generator(config: &Config) -> Result<Arc<dyn Generator>> {
    let policy = RetryPolicy::from_config(&config.resilience);
    Ok(Arc::new(Resilient::new(
        create_generator(&config.generation)?,
        policy,
    )))
}

pub fn vector_store(config: &Config, pool: &SqlitePool) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match config.vector_store.provider.as_str() {
        "pinecone" => Arc::new(PineconeVectorStore::new(
            &config.vector_store,
            RetryPolicy::from_config(&config.resilience),
        )?),
        "memory" => Arc::new(InMemoryVectorStore::new()),
        "sqlite" => Arc::new(SqliteVectorStore::new(pool.clone())),
        other => anyhow::bail!("Unknown vector store provider: {}", other),
    };
    Ok(store)
}

pub fn document_store(pool: &SqlitePool) -> Arc<dyn DocumentStore> {
    Arc::new(SqliteDocumentStore::new(pool.clone()))
}

pub fn interaction_log(pool: &SqlitePool) -> Arc<dyn InteractionLog> {
    Arc::new(SqliteInteractionLog::new(pool.clone()))
}

pub fn knowledge_base(config: &Config, pool: &SqlitePool) -> Result<KnowledgeBaseBuilder> {
    let settings = BuildSettings {
        max_chunk_size: config.chunking.max_chunk_size,
        namespace: config.vector_store.namespace.clone(),
    };
    Ok(KnowledgeBaseBuilder::new(
        embedding_client(config)?,
        vector_store(config, pool)?,
        document_store(pool),
        settings,
    )?)
}

pub fn responder(config: &Config, pool: &SqlitePool) -> Result<RetrievalAugmentedResponder> {
    let settings = ResponderSettings {
        namespace: config.vector_store.namespace.clone(),
        top_k: config.retrieval.top_k,
        sampling: SamplingParams {
            max_tokens: config.generation.max_tokens,
            temperature: config.generation.temperature,
        },
    };
    Ok(RetrievalAugmentedResponder::new(
        embedding_client(config)?,
        vector_store(config, pool)?,
        generator(config)?,
        interaction_log(pool),
        settings,
    )?)
}

pub fn topic_extractor(config: &Config) -> Box<dyn TopicExtractor> {
    match config.analytics.extractor.as_str() {
        "frequency" => Box::new(FrequencyTopicExtractor::new(config.analytics.max_topics)),
        _ => Box::new(KeywordTopicExtractor::new(config.analytics.keywords.iter().cloned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::{db, migrate};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_default_config_wires_offline_components() {
        let tmp = TempDir::new().unwrap();
        let cfg = parse_config(&format!(
            "[db]\npath = \"{}\"\n",
            tmp.path().join("srag.sqlite").display()
        ))
        .unwrap();
        let pool = db::connect(&cfg).await.unwrap();
        migrate::run_migrations(&pool).await.unwrap();

        let builder = knowledge_base(&cfg, &pool).unwrap();
        assert_eq!(builder.settings().max_chunk_size, 500);
        assert_eq!(builder.settings().namespace, "syllabus");
        assert!(responder(&cfg, &pool).is_ok());
    }

    #[test]
    fn test_extractor_selection() {
        let cfg = parse_config("[db]\npath = \"x\"\n[analytics]\nkeywords = [\"Vectors\"]\n").unwrap();
        let extractor = topic_extractor(&cfg);
        assert_eq!(extractor.extract("Tell me about vectors"), vec!["vectors"]);

        let cfg = parse_config("[db]\npath = \"x\"\n[analytics]\nextractor = \"frequency\"\n").unwrap();
        let extractor = topic_extractor(&cfg);
        assert!(extractor.extract("matrices matrices matrices").contains(&"matrices".to_string()));
    }
}
