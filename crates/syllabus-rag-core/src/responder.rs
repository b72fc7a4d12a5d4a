//! Retrieval-augmented answering.
//!
//! For each prompt:
//!
//! 1. Reject blank prompts before any external call.
//! 2. Embed the prompt.
//! 3. Query the vector store for the `top_k` nearest chunks.
//! 4. Join their texts, best match first, one per line.
//! 5. Wrap the context and question in the grounded prompt template.
//! 6. Generate, then trim the reply.
//! 7. Append the exchange to the interaction log.
//!
//! Any failure in steps 2–6 surfaces as a single [`RagError::Generation`].
//! A failure in step 7 is only logged: the caller still gets the answer,
//! flagged with `logged: false`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::embedding::EmbeddingClient;
use crate::error::{RagError, Result};
use crate::generation::{GenerationRequest, Generator, SamplingParams};
use crate::models::{Answer, QueryMatch};
use crate::store::{validate_top_k, InteractionLog, VectorStore};

pub const QUESTION_MARKER: &str = "User Question:";
pub const ANSWER_MARKER: &str = "AI Answer:";

/// Answer-time settings.
#[derive(Debug, Clone)]
pub struct ResponderSettings {
    pub namespace: String,
    pub top_k: usize,
    pub sampling: SamplingParams,
}

impl Default for ResponderSettings {
    fn default() -> Self {
        Self {
            namespace: "syllabus".to_string(),
            top_k: 5,
            sampling: SamplingParams::default(),
        }
    }
}

pub struct RetrievalAugmentedResponder {
    embeddings: EmbeddingClient,
    vectors: Arc<dyn VectorStore>,
    generator: Arc<dyn Generator>,
    log: Arc<dyn InteractionLog>,
    settings: ResponderSettings,
}

impl RetrievalAugmentedResponder {
    pub fn new(
        embeddings: EmbeddingClient,
        vectors: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
        log: Arc<dyn InteractionLog>,
        settings: ResponderSettings,
    ) -> Result<Self> {
        validate_top_k(settings.top_k)?;
        Ok(Self {
            embeddings,
            vectors,
            generator,
            log,
            settings,
        })
    }

    /// Answer `prompt` on behalf of `user_ref`.
    pub async fn answer(&self, prompt: &str, user_ref: &str) -> Result<Answer> {
        if prompt.trim().is_empty() {
            return Err(RagError::validation("prompt is required"));
        }

        let text = self
            .generate_grounded(prompt)
            .await
            .map_err(|e| {
                warn!(error = %e, "answer generation failed");
                RagError::Generation(Box::new(e))
            })?;

        let logged = match self.log.append(user_ref, prompt, &text, Utc::now()).await {
            Ok(interaction) => {
                debug!(interaction_id = %interaction.id, "interaction logged");
                true
            }
            Err(e) => {
                warn!(error = %e, user = %user_ref, "failed to log interaction; answer still returned");
                false
            }
        };

        Ok(Answer { text, logged })
    }

    async fn generate_grounded(&self, prompt: &str) -> Result<String> {
        let query = self.embeddings.embed_one_text(prompt).await?;
        let matches = self
            .vectors
            .query(&self.settings.namespace, &query.values, self.settings.top_k)
            .await?;
        info!(hits = matches.len(), namespace = %self.settings.namespace, "retrieved context");

        let request = GenerationRequest {
            prompt: grounded_prompt(&matches, prompt),
            params: self.settings.sampling,
        };
        let reply = self.generator.generate(&request).await?;
        Ok(reply.trim().to_string())
    }
}

/// Assemble the prompt sent to the generator.
///
/// ```text
/// <chunk 1>
/// <chunk 2>
///
/// User Question: <prompt>
/// AI Answer:
/// ```
pub fn grounded_prompt(matches: &[QueryMatch], prompt: &str) -> String {
    let context = matches
        .iter()
        .map(|m| m.metadata.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    format!("{context}\n\n{QUESTION_MARKER} {prompt}\n{ANSWER_MARKER}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordMetadata;

    fn hit(text: &str, score: f32) -> QueryMatch {
        QueryMatch {
            id: text.to_string(),
            score,
            metadata: RecordMetadata::text_only(text),
        }
    }

    #[test]
    fn test_grounded_prompt_layout() {
        let p = grounded_prompt(&[hit("first", 0.9), hit("second", 0.5)], "what is algebra");
        assert_eq!(
            p,
            "first\nsecond\n\nUser Question: what is algebra\nAI Answer:"
        );
    }

    #[test]
    fn test_grounded_prompt_without_context() {
        let p = grounded_prompt(&[], "hi");
        assert_eq!(p, "\n\nUser Question: hi\nAI Answer:");
    }
}
