//! Bounded calls to the embedding provider
//!
//! Every provider call goes through [`BoundedEmbedder`], which applies the
//! call timeout and checks the returned vector against the declared
//! dimensionality. Wrong-length vectors are rejected, never truncated or padded.

use intent_embedder::{Embedding, SharedEmbedder};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, RouterError};

/// Default per-call timeout
pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct BoundedEmbedder {
    inner: SharedEmbedder,
    timeout: Duration,
}

impl std::fmt::Debug for BoundedEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedEmbedder")
            .field("model", &self.inner.model_name())
            .field("dimension", &self.inner.dimension())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl BoundedEmbedder {
    pub fn new(inner: SharedEmbedder, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Dimension `D` every returned vector must have
    pub fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    pub fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Embed one text, surfacing timeouts and contract violations as provider errors
    pub async fn embed(&self, text: &str) -> Result<Embedding> {
        let embedding = match tokio::time::timeout(self.timeout, self.inner.embed(text)).await {
            Ok(Ok(embedding)) => embedding,
            Ok(Err(e)) => {
                warn!(model = self.model_name(), "embedding call failed: {:#}", e);
                return Err(RouterError::provider(text, format!("{:#}", e)));
            }
            Err(_) => {
                warn!(
                    model = self.model_name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "embedding call timed out"
                );
                return Err(RouterError::provider(
                    text,
                    format!("timed out after {:?}", self.timeout),
                ));
            }
        };

        let expected = self.dimension();
        if embedding.len() != expected {
            return Err(RouterError::provider(
                text,
                format!(
                    "expected {}-dimensional vector, got {}",
                    expected,
                    embedding.len()
                ),
            ));
        }
        if embedding.iter().any(|x| !x.is_finite()) {
            return Err(RouterError::provider(text, "vector contains non-finite values"));
        }

        debug!(dimension = expected, "embedded text");
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intent_embedder::StaticEmbedder;
    use std::sync::Arc;

    fn bounded(embedder: StaticEmbedder) -> BoundedEmbedder {
        BoundedEmbedder::new(Arc::new(embedder), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_passes_valid_vector() {
        let embedder = bounded(StaticEmbedder::new(2).with("hi", vec![1.0, 0.0]));
        assert_eq!(embedder.embed("hi").await.unwrap(), vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_provider_error() {
        let embedder = bounded(StaticEmbedder::new(3).with("hi", vec![1.0, 0.0]));
        let err = embedder.embed("hi").await.unwrap_err();
        match err {
            RouterError::EmbeddingProvider { text, reason } => {
                assert_eq!(text, "hi");
                assert!(reason.contains("expected 3-dimensional"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_finite_is_provider_error() {
        let embedder = bounded(StaticEmbedder::new(2).with("hi", vec![f32::NAN, 0.0]));
        assert!(matches!(
            embedder.embed("hi").await,
            Err(RouterError::EmbeddingProvider { .. })
        ));
    }

    #[tokio::test]
    async fn test_provider_failure_is_provider_error() {
        let embedder = bounded(StaticEmbedder::new(2).fail_on("hi"));
        assert!(matches!(
            embedder.embed("hi").await,
            Err(RouterError::EmbeddingProvider { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_provider_error() {
        let embedder = bounded(
            StaticEmbedder::new(2)
                .with("hi", vec![1.0, 0.0])
                .with_delay(Duration::from_secs(5)),
        );
        let err = embedder.embed("hi").await.unwrap_err();
        match err {
            RouterError::EmbeddingProvider { reason, .. } => {
                assert!(reason.contains("timed out"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
