//! Router YAML configuration
//!
//! Defines the serde schema for `config/routes.yaml`: the intent catalogue,
//! the matching threshold, the provider timeout and which embedder to use.

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use intent_embedder::{OpenAIEmbedder, SharedEmbedder};

use crate::engine::{RouterSettings, DEFAULT_THRESHOLD};
use crate::error::{Result, RouterError};
use crate::provider::DEFAULT_EMBED_TIMEOUT;
use crate::registry::RouteRegistry;

/// Env var naming the config file
pub const CONFIG_PATH_ENV: &str = "INTENT_ROUTER_CONFIG";

/// Config file used when `INTENT_ROUTER_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/routes.yaml";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// Cosine distance an intent must be strictly below to match
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Upper bound on every embedding provider call
    #[serde(default = "default_embed_timeout_ms")]
    pub embed_timeout_ms: u64,

    #[serde(default)]
    pub embedder: EmbedderConfig,

    pub intents: Vec<IntentConfig>,
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_embed_timeout_ms() -> u64 {
    DEFAULT_EMBED_TIMEOUT.as_millis() as u64
}

/// Definition of a single intent
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntentConfig {
    pub name: String,
    /// Lower wins when several intents match
    pub priority: u32,
    pub examples: Vec<String>,
}

/// Which embedding provider to construct
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbedderConfig {
    /// OpenAI-compatible `/embeddings` endpoint; key from `OPENAI_API_KEY`
    Openai {
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        dimension: Option<usize>,
        #[serde(default)]
        base_url: Option<String>,
    },
    /// In-process sentence-transformer (requires the `local-model` feature)
    Local {
        #[serde(default)]
        model: Option<String>,
    },
}

/// MiniLM is the model the default threshold was tuned for
impl Default for EmbedderConfig {
    fn default() -> Self {
        Self::Local { model: None }
    }
}

impl EmbedderConfig {
    /// Construct the configured provider
    pub fn connect(&self) -> Result<SharedEmbedder> {
        match self {
            Self::Openai {
                model,
                dimension,
                base_url,
            } => {
                let model = match model {
                    Some(model) => {
                        let dimension = dimension.ok_or_else(|| {
                            RouterError::Config(format!(
                                "embedder model '{}' needs an explicit dimension",
                                model
                            ))
                        })?;
                        Some((model.clone(), dimension))
                    }
                    None => None,
                };

                let mut embedder = OpenAIEmbedder::from_env()
                    .map_err(|e| RouterError::Config(format!("{:#}", e)))?;
                if let Some((model, dimension)) = model {
                    embedder = embedder.with_model_name(model, dimension);
                }
                if let Some(url) = base_url {
                    embedder = embedder.with_base_url(url.clone());
                }
                Ok(Arc::new(embedder))
            }
            #[cfg(feature = "local-model")]
            Self::Local { model } => {
                let embedder = match model {
                    Some(model) => intent_embedder::LocalEmbedder::with_model(model),
                    None => intent_embedder::LocalEmbedder::new(),
                }
                .map_err(|e| RouterError::Config(format!("{:#}", e)))?;
                Ok(Arc::new(embedder))
            }
            #[cfg(not(feature = "local-model"))]
            Self::Local { .. } => Err(RouterError::Config(
                "local embedder requested but the `local-model` feature is disabled".to_string(),
            )),
        }
    }
}

impl RouterConfig {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading router configuration from {}", path.display());

        let content = std::fs::read_to_string(path)
            .map_err(|e| RouterError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let config = Self::from_yaml(&content)?;

        info!(
            intents = config.intents.len(),
            threshold = config.threshold,
            "Loaded router configuration"
        );
        Ok(config)
    }

    /// Load from `INTENT_ROUTER_CONFIG`, or `config/routes.yaml` by default
    pub fn from_env() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    /// Load configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: RouterConfig =
            serde_yaml::from_str(yaml).map_err(|e| RouterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.threshold.is_nan() {
            return Err(RouterError::Config("threshold must be a number".to_string()));
        }
        if self.embed_timeout_ms == 0 {
            return Err(RouterError::Config(
                "embed_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Build a validated registry in declaration order
    pub fn registry(&self) -> Result<RouteRegistry> {
        let mut registry = RouteRegistry::new();
        for intent in &self.intents {
            registry.add_intent(&intent.name, intent.priority, &intent.examples)?;
        }
        Ok(registry)
    }

    pub fn settings(&self) -> RouterSettings {
        RouterSettings {
            threshold: self.threshold,
            embed_timeout: Duration::from_millis(self.embed_timeout_ms),
        }
    }
}
