//! Deterministic lookup-table embedder
//!
//! Maps known texts to fixed vectors so routing decisions can be exercised
//! without a model. Unknown texts are an error, which keeps test fixtures
//! honest about every call the router makes.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::{Embedder, Embedding};

#[derive(Debug, Default)]
pub struct StaticEmbedder {
    dimension: usize,
    vectors: HashMap<String, Embedding>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    blocking_delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    /// Register the vector returned for `text`
    pub fn with(mut self, text: impl Into<String>, vector: Embedding) -> Self {
        self.insert(text, vector);
        self
    }

    pub fn insert(&mut self, text: impl Into<String>, vector: Embedding) {
        self.vectors.insert(text.into(), vector);
    }

    /// Make every call for `text` fail
    pub fn fail_on(mut self, text: impl Into<String>) -> Self {
        self.failing.insert(text.into());
        self
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Block a pool thread before answering each call, like a CPU-bound model
    pub fn with_blocking_delay(mut self, delay: Duration) -> Self {
        self.blocking_delay = Some(delay);
        self
    }

    /// Number of `embed` calls served so far (including failed ones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl Embedder for StaticEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(delay) = self.blocking_delay {
            tokio::task::spawn_blocking(move || std::thread::sleep(delay)).await?;
        }

        if self.failing.contains(text) {
            return Err(anyhow!("injected failure for {:?}", text));
        }

        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| anyhow!("no fixture vector for {:?}", text))
    }

    fn model_name(&self) -> &str {
        "static"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
