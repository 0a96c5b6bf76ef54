//! Sentence embedding using Candle and all-MiniLM-L6-v2
//!
//! Loads `sentence-transformers/all-MiniLM-L6-v2` and computes
//! 384-dimensional embeddings. MiniLM is a symmetric similarity model:
//! queries and examples are embedded the same way, with mean pooling over
//! the attention mask followed by L2 normalisation.
//!
//! The forward pass is CPU-bound, so it runs on tokio's blocking pool. The
//! caller only awaits the join handle, which keeps timeouts effective and
//! lets several texts be embedded in parallel.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::{Embedder, Embedding};

/// Model repository on HuggingFace Hub
const MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Embedding dimension of all-MiniLM-L6-v2
pub const EMBEDDING_DIM: usize = 384;

/// all-MiniLM-L6-v2 was trained on 256-token windows
const MAX_TOKENS: usize = 256;

/// Loaded weights and tokenizer, shared with blocking tasks
struct MiniLm {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

pub struct LocalEmbedder {
    inner: Arc<MiniLm>,
    model_name: String,
    dimension: usize,
}

impl LocalEmbedder {
    /// Create a new embedder, downloading the model if needed
    ///
    /// The model is cached in the HuggingFace cache directory (~/.cache/huggingface).
    pub fn new() -> Result<Self> {
        Self::with_model(MODEL_REPO)
    }

    /// Create an embedder from any BERT-family sentence-transformer repo
    pub fn with_model(model_name: &str) -> Result<Self> {
        info!("Loading embedding model: {}", model_name);

        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_name.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .context("Failed to download config.json")?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .context("Failed to download tokenizer.json")?;
        let weights_path = repo
            .get("model.safetensors")
            .context("Failed to download model.safetensors")?;

        debug!("Model files downloaded to cache");

        let config: Config = serde_json::from_str(
            &std::fs::read_to_string(&config_path).context("Failed to read config.json")?,
        )
        .context("Failed to parse config.json")?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

        // SAFETY: the safetensors file lives in the read-only hub cache for
        // the lifetime of the process.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                .context("Failed to load model weights")?
        };

        let model = BertModel::load(vb, &config).context("Failed to build BERT model")?;

        info!(
            hidden_size = config.hidden_size,
            "Embedding model loaded successfully"
        );

        Ok(Self {
            inner: Arc::new(MiniLm {
                model,
                tokenizer,
                device,
            }),
            model_name: model_name.to_string(),
            dimension: config.hidden_size,
        })
    }

    /// Run the forward pass on the blocking pool
    async fn encode(&self, texts: Vec<String>) -> Result<Vec<Embedding>> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            inner.forward_batch(&refs)
        })
        .await
        .context("Embedding task failed to complete")?
    }
}

impl MiniLm {
    /// Batch forward pass with mean pooling
    fn forward_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut all_input_ids = Vec::with_capacity(texts.len() * max_len);
        let mut all_attention_mask = Vec::with_capacity(texts.len() * max_len);
        let mut all_token_type_ids = Vec::with_capacity(texts.len() * max_len);

        for encoding in &encodings {
            let mut ids = encoding.get_ids().to_vec();
            let mut attention = encoding.get_attention_mask().to_vec();
            let mut type_ids = encoding.get_type_ids().to_vec();

            ids.resize(max_len, 0);
            attention.resize(max_len, 0);
            type_ids.resize(max_len, 0);

            all_input_ids.extend(ids);
            all_attention_mask.extend(attention);
            all_token_type_ids.extend(type_ids);
        }

        let batch_size = texts.len();

        let input_ids = Tensor::from_vec(all_input_ids, (batch_size, max_len), &self.device)?;
        let attention_mask =
            Tensor::from_vec(all_attention_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids =
            Tensor::from_vec(all_token_type_ids, (batch_size, max_len), &self.device)?;

        // (batch_size, seq_len, hidden_size)
        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean pooling: padding tokens must not contribute
        let mask = attention_mask.to_dtype(DTYPE)?.unsqueeze(2)?;
        let summed = output.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
        let pooled = summed.broadcast_div(&counts)?;

        let normalized = Self::l2_normalize(&pooled)?;

        Ok(normalized.to_vec2::<f32>()?)
    }

    fn l2_normalize(tensor: &Tensor) -> Result<Tensor> {
        let norm = tensor
            .sqr()?
            .sum_keepdim(1)?
            .sqrt()?
            .clamp(1e-12, f64::MAX)?;
        Ok(tensor.broadcast_div(&norm)?)
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.encode(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Model returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        self.encode(texts.iter().map(|t| t.to_string()).collect())
            .await
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
