//! Text-generation provider trait.
//!
//! Concrete providers (OpenAI completions, Ollama) live in the
//! application crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            temperature: 0.7,
        }
    }
}

/// A single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub params: SamplingParams,
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-3.5-turbo-instruct"`).
    fn model_name(&self) -> &str;

    /// Returns the raw generated text; callers trim it.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
