//! Embedding cache
//!
//! Holds, for every intent, its examples and one embedding per example in the
//! same order. Entries are computed whole: an intent either has all of its
//! embeddings or is absent.
//!
//! ```text
//! RouteRegistry ──► build() ──► embed every example once (concurrently)
//!                                  │
//!                                  ▼
//!                     name → CachedIntent { examples, EmbeddingMatrix }
//! ```

use futures::future::try_join_all;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use crate::error::{Result, RouterError};
use crate::matrix::EmbeddingMatrix;
use crate::provider::BoundedEmbedder;
use crate::registry::{Intent, RouteRegistry};

/// Examples of one intent paired row-for-row with their embeddings
#[derive(Debug, Clone)]
pub struct CachedIntent {
    examples: Vec<String>,
    embeddings: EmbeddingMatrix,
}

impl CachedIntent {
    /// Embed every example of `intent`; any failure discards the whole entry
    async fn compute(intent: &Intent, embedder: &BoundedEmbedder) -> Result<Self> {
        let vectors = try_join_all(intent.examples.iter().map(|e| embedder.embed(e))).await?;

        let mut embeddings = EmbeddingMatrix::with_capacity(embedder.dimension(), vectors.len())?;
        for (example, vector) in intent.examples.iter().zip(&vectors) {
            embeddings
                .push_row(vector)
                .map_err(|e| RouterError::provider(example, e))?;
        }

        debug!(
            intent = %intent.name,
            examples = embeddings.len(),
            "cached intent embeddings"
        );

        Ok(Self {
            examples: intent.examples.clone(),
            embeddings,
        })
    }

    /// (example, embedding) pairs in example order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &[f32])> + '_ {
        self.examples
            .iter()
            .map(String::as_str)
            .zip(self.embeddings.rows())
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    dimension: usize,
    entries: HashMap<String, CachedIntent>,
}

impl EmbeddingCache {
    /// Embed every example of every intent
    ///
    /// Makes exactly `registry.total_examples()` provider calls. The first
    /// error aborts the build and no cache is returned.
    #[instrument(skip_all, fields(intents = registry.len(), model = embedder.model_name()))]
    pub async fn build(registry: &RouteRegistry, embedder: &BoundedEmbedder) -> Result<Self> {
        let dimension = embedder.dimension();
        if dimension == 0 {
            return Err(RouterError::Config(format!(
                "embedder '{}' declares a zero dimension",
                embedder.model_name()
            )));
        }

        info!(
            examples = registry.total_examples(),
            dimension, "building embedding cache"
        );

        let computed = try_join_all(
            registry
                .list_intents()
                .iter()
                .map(|intent| CachedIntent::compute(intent, embedder)),
        )
        .await?;

        let entries: HashMap<_, _> = registry
            .list_intents()
            .iter()
            .map(|intent| intent.name.clone())
            .zip(computed)
            .collect();

        info!(intents = entries.len(), "embedding cache built");

        Ok(Self { dimension, entries })
    }

    /// Embed one intent and insert it, replacing any previous entry whole
    ///
    /// Nothing changes unless every example embedded successfully.
    pub async fn insert(&mut self, intent: &Intent, embedder: &BoundedEmbedder) -> Result<()> {
        if embedder.dimension() != self.dimension {
            return Err(RouterError::Config(format!(
                "embedder dimension {} differs from cache dimension {}",
                embedder.dimension(),
                self.dimension
            )));
        }
        let entry = CachedIntent::compute(intent, embedder).await?;
        self.entries.insert(intent.name.clone(), entry);
        Ok(())
    }

    pub fn entry(&self, name: &str) -> Result<&CachedIntent> {
        self.entries
            .get(name)
            .ok_or_else(|| RouterError::NotFound(name.to_string()))
    }

    /// Ordered (example, embedding) pairs for an intent
    pub fn get(&self, name: &str) -> Result<Vec<(&str, &[f32])>> {
        Ok(self.entry(name)?.pairs().collect())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_examples(&self) -> usize {
        self.entries.values().map(|e| e.embeddings.len()).sum()
    }
}
