//! Shared HTTP plumbing for the remote providers.
//!
//! Status mapping:
//! - 2xx → parsed JSON body
//! - 429 and 5xx → retryable provider error
//! - other 4xx → non-retryable provider error
//! - connection failure → retryable provider error

use reqwest::RequestBuilder;
use serde_json::Value;

use syllabus_rag_core::{RagError, Result};

/// Build a client. Per-call timeouts are applied by [`crate::retry`].
pub fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| RagError::provider("http", format!("failed to build client: {}", e)))
}

pub async fn send_json(provider: &str, request: RequestBuilder) -> Result<Value> {
    let response = request
        .header("Content-Type", "application/json")
        .send()
        .await
        .map_err(|e| RagError::transient(provider, format!("request failed: {}", e)))?;

    let status = response.status();

    if status.is_success() {
        return response
            .json::<Value>()
            .await
            .map_err(|e| RagError::provider(provider, format!("invalid response body: {}", e)));
    }

    let body_text = response.text().await.unwrap_or_default();
    let message = format!("API error {}: {}", status, body_text);

    if status.as_u16() == 429 || status.is_server_error() {
        Err(RagError::transient(provider, message))
    } else {
        Err(RagError::provider(provider, message))
    }
}

/// Read an API key from the environment.
pub fn api_key(var: &str) -> Result<String> {
    std::env::var(var)
        .map_err(|_| RagError::provider(var, format!("{} environment variable not set", var)))
}

/// Join a base URL and a path without doubling the slash.
pub fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Parse a JSON number array into `f32`s.
pub fn parse_vector(value: &Value, provider: &str) -> Result<Vec<f32>> {
    value
        .as_array()
        .ok_or_else(|| RagError::provider(provider, "invalid response: vector is not an array"))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| RagError::provider(provider, "invalid response: non-numeric value"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_trims_slash() {
        assert_eq!(
            endpoint("https://api.openai.com/", "/v1/embeddings"),
            "https://api.openai.com/v1/embeddings"
        );
        assert_eq!(
            endpoint("http://localhost:11434", "/api/embed"),
            "http://localhost:11434/api/embed"
        );
    }

    #[test]
    fn test_parse_vector() {
        assert_eq!(
            parse_vector(&json!([0.5, 1, -2.0]), "t").unwrap(),
            vec![0.5, 1.0, -2.0]
        );
        assert!(parse_vector(&json!("nope"), "t").is_err());
        assert!(parse_vector(&json!([1.0, "x"]), "t").is_err());
    }
}
