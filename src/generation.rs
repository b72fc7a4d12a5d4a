//! Text-generation providers.
//!
//! - **[`OpenAIGenerator`]**: `POST /v1/completions`, reading
//!   `choices[0].text`. Requires `OPENAI_API_KEY`.
//! - **[`OllamaGenerator`]**: `POST /api/generate` with `stream: false`,
//!   reading `response`.
//! - **[`DisabledGenerator`]**: fails every call.

use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use serde_json::Value;

use syllabus_rag_core::generation::{GenerationRequest, Generator, SamplingParams};
use syllabus_rag_core::{RagError, Result};

use crate::config::GenerationConfig;
use crate::http;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        Err(RagError::provider(
            "generation",
            "generation is disabled; set [generation] provider in config",
        ))
    }
}

pub struct OpenAIGenerator {
    model: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIGenerator {
    pub fn new(config: &GenerationConfig) -> anyhow::Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("generation.model required for OpenAI provider"))?;

        let api_key = match std::env::var("OPENAI_API_KEY") {
            Ok(key) => key,
            Err(_) => bail!("OPENAI_API_KEY environment variable not set"),
        };

        Ok(Self {
            model,
            base_url: config
                .url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            api_key,
            client: http::client()?,
        })
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = openai_body(&self.model, request);

        let builder = self
            .client
            .post(http::endpoint(&self.base_url, "/v1/completions"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body);

        let json = http::send_json("openai", builder).await?;
        parse_openai_completion(&json)
    }
}

fn openai_body(model: &str, request: &GenerationRequest) -> Value {
    let SamplingParams {
        max_tokens,
        temperature,
    } = request.params;
    serde_json::json!({
        "model": model,
        "prompt": request.prompt,
        "max_tokens": max_tokens,
        "temperature": temperature,
    })
}

fn parse_openai_completion(json: &Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("text"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| RagError::provider("openai", "invalid response: missing choices[0].text"))
}

pub struct OllamaGenerator {
    model: String,
    url: String,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> anyhow::Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("generation.model required for Ollama provider"))?;

        Ok(Self {
            model,
            url: config
                .url
                .clone()
                .unwrap_or_else(|| OLLAMA_BASE_URL.to_string()),
            client: http::client()?,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = ollama_body(&self.model, request);

        let builder = self
            .client
            .post(http::endpoint(&self.url, "/api/generate"))
            .json(&body);

        let json = http::send_json("ollama", builder).await?;
        json.get("response")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| RagError::provider("ollama", "invalid response: missing response field"))
    }
}

fn ollama_body(model: &str, request: &GenerationRequest) -> Value {
    serde_json::json!({
        "model": model,
        "prompt": request.prompt,
        "stream": false,
        "options": {
            "num_predict": request.params.max_tokens,
            "temperature": request.params.temperature,
        },
    })
}

/// Instantiate the generator named by `config.provider`.
pub fn create_generator(config: &GenerationConfig) -> anyhow::Result<Arc<dyn Generator>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledGenerator)),
        "openai" => Ok(Arc::new(OpenAIGenerator::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaGenerator::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}
