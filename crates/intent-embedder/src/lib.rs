//! Text embedding providers
//!
//! The router treats the embedding model as a black box: text goes in, a
//! fixed-length vector comes out. This crate defines that seam and ships the
//! providers behind it.
//!
//! ```text
//!   "Hi there!"
//!       │
//!       ▼
//! ┌─────────────────────────────────────────┐
//! │  Embedder (trait)                       │
//! │  ├── OpenAIEmbedder   (hosted API)      │
//! │  ├── LocalEmbedder    (all-MiniLM-L6)   │
//! │  └── StaticEmbedder   (lookup table)    │
//! └─────────────────────────────────────────┘
//!       │
//!       ▼
//!   [f32; D]
//! ```

#[cfg(feature = "local-model")]
pub mod local;
pub mod openai;
pub mod fixture;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(feature = "local-model")]
pub use local::LocalEmbedder;
pub use fixture::StaticEmbedder;
pub use openai::OpenAIEmbedder;

/// Embedding vector type
pub type Embedding = Vec<f32>;

/// Trait for text embedding services
///
/// Implementations must not block the calling task: CPU-bound inference
/// belongs on `tokio::task::spawn_blocking` so callers can bound each call
/// with a timeout.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for text
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Batch embed multiple texts, preserving input order
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Model identifier
    fn model_name(&self) -> &str;

    /// Embedding dimension every call is expected to return
    fn dimension(&self) -> usize;
}

/// Shared embedder type for use across tasks
pub type SharedEmbedder = Arc<dyn Embedder>;
