//! Router error taxonomy
//!
//! "No match" is not represented here: a query that matches nothing is a
//! successful `Ok(None)`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    /// Malformed input: empty query, empty examples, duplicate names, bad threshold
    #[error("validation failed: {0}")]
    Validation(String),

    /// The embedding provider failed, timed out, or broke its contract
    #[error("embedding provider failed for {text:?}: {reason}")]
    EmbeddingProvider { text: String, reason: String },

    /// An intent is missing from the cache
    #[error("intent not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RouterError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn provider(text: &str, reason: impl ToString) -> Self {
        Self::EmbeddingProvider {
            text: text.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;
