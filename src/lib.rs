//! Semantic Intent Router
//!
//! Classifies a natural-language query into one of a fixed set of intents by
//! comparing its embedding with the embeddings of each intent's example
//! utterances.
//!
//! # Architecture
//!
//! ```text
//! config/routes.yaml
//!       │
//!       ▼
//! ┌─────────────────────────────────────────┐
//! │  RouteRegistry                          │
//! │  greeting(1) farewell(2) weather(3)     │
//! └─────────────────────────────────────────┘
//!       │  build (once, every example)
//!       ▼
//! ┌─────────────────────────────────────────┐
//! │  EmbeddingCache                         │
//! │  name → [example ↔ [f32; D]]            │
//! └─────────────────────────────────────────┘
//!       │  route (per query, read-only)
//!       ▼
//! ┌─────────────────────────────────────────┐
//! │  Router                                 │
//! │  min cosine distance per intent         │
//! │  → filter < threshold                   │
//! │  → order by (priority, distance)        │
//! └─────────────────────────────────────────┘
//!       │
//!       ├─── Some(MatchResult)
//!       └─── None (no match)
//! ```

pub mod cache;
pub mod config;
pub mod distance;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod provider;
pub mod registry;

pub use cache::{CachedIntent, EmbeddingCache};
pub use config::{EmbedderConfig, IntentConfig, RouterConfig};
pub use engine::{MatchResult, Router, RouterSettings, DEFAULT_THRESHOLD};
pub use error::{Result, RouterError};
pub use matrix::EmbeddingMatrix;
pub use provider::BoundedEmbedder;
pub use registry::{Intent, RouteRegistry};

// Re-export the provider seam so callers need only this crate
pub use intent_embedder::{Embedder, Embedding, SharedEmbedder, StaticEmbedder};
