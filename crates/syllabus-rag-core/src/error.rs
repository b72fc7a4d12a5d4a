//! Error taxonomy shared by every pipeline component.
//!
//! | Variant | Raised when |
//! |---------|-------------|
//! | [`RagError::Validation`] | empty prompt, zero chunk size or `top_k` |
//! | [`RagError::Provider`] | embedding, generation, or vector-store call failed (incl. timeout) |
//! | [`RagError::NotFound`] | rebuild requested but no document is stored |
//! | [`RagError::Integrity`] | a provider broke its contract (e.g. vector count ≠ input count) |
//! | [`RagError::Storage`] | the document store or interaction log failed |
//! | [`RagError::Generation`] | opaque wrapper for any failure while answering a prompt |

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{provider} error: {message}")]
    Provider {
        provider: String,
        message: String,
        /// Rate limits, 5xx responses, connection failures, and timeouts.
        retryable: bool,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("failed to generate a response")]
    Generation(#[source] Box<RagError>),
}

impl RagError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// A provider failure that will not succeed on retry (auth, bad request).
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            retryable: false,
        }
    }

    /// A transient provider failure: rate limit, server error, or timeout.
    pub fn transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            retryable: true,
        }
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Provider {
                retryable: true,
                ..
            }
        )
    }
}
