use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{
    BertModel, Config as BertConfig, HiddenAct, PositionEmbeddingType,
};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;
use tokio::fs;
use tokio::time::Instant;
use tracing::{debug, error, info};

use super::embedding::Embedder;
use super::{MODEL_URL, TARGET_VECTOR, TOKENIZER_URL};

/// Configuration struct for the E5 embedding model
#[derive(Debug, Clone)]
pub struct E5Config {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub dimensions: usize,
    pub max_length: usize,
    pub device: Device,
}

impl Default for E5Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/e5-large-v2.safetensors"),
            tokenizer_path: PathBuf::from("models/e5-tokenizer.json"),
            dimensions: 1024,
            max_length: 512,
            device: Device::Cpu,
        }
    }
}

impl E5Config {
    pub fn with_paths(model_path: &Path, tokenizer_path: &Path) -> Self {
        Self {
            model_path: model_path.to_path_buf(),
            tokenizer_path: tokenizer_path.to_path_buf(),
            ..Self::default()
        }
    }

    /// Download the model and tokenizer when they are not on disk yet.
    pub async fn ensure_models_exist(&self) -> Result<()> {
        for (path, url) in [
            (&self.model_path, MODEL_URL),
            (&self.tokenizer_path, TOKENIZER_URL),
        ] {
            if path.exists() {
                continue;
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await?;
            }

            info!(target: TARGET_VECTOR, "Downloading {} to {}", url, path.display());
            let response = reqwest::get(url).await?.error_for_status()?;
            let bytes = response.bytes().await?;
            fs::write(path, bytes).await?;
            info!(target: TARGET_VECTOR, "Downloaded {}", path.display());
        }

        Ok(())
    }

    fn bert_config(&self) -> BertConfig {
        BertConfig {
            hidden_size: self.dimensions,
            intermediate_size: 4096,
            max_position_embeddings: self.max_length,
            num_attention_heads: 16,
            num_hidden_layers: 24,
            vocab_size: 30522,
            layer_norm_eps: 1e-12,
            pad_token_id: 0,
            hidden_act: HiddenAct::Gelu,
            hidden_dropout_prob: 0.0,
            type_vocab_size: 2,
            initializer_range: 0.02,
            position_embedding_type: PositionEmbeddingType::Absolute,
            use_cache: false,
            classifier_dropout: None,
            model_type: None,
        }
    }
}

/// E5 sentence encoder: BERT forward pass, masked mean pooling, L2 normalization.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    config: E5Config,
}

impl BertEmbedder {
    pub fn load(config: E5Config) -> Result<Self> {
        info!(target: TARGET_VECTOR, "Starting to load E5 model from {}", config.model_path.display());

        let buffer = std::fs::read(&config.model_path)
            .with_context(|| format!("Failed to read {}", config.model_path.display()))?;
        let tensors = candle_core::safetensors::load_buffer(&buffer, &config.device).map_err(|e| {
            error!(target: TARGET_VECTOR, "!!! Failed to load model tensors: {}", e);
            anyhow::anyhow!("Failed to load model tensors: {}", e)
        })?;
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &config.device);
        let model = BertModel::load(vb, &config.bert_config()).map_err(|e| {
            error!(target: TARGET_VECTOR, "!!! Failed to load BERT model: {}", e);
            anyhow::anyhow!("Failed to load BERT model: {}", e)
        })?;

        let tokenizer = Tokenizer::from_file(&config.tokenizer_path).map_err(|e| {
            error!(target: TARGET_VECTOR, "!!! Failed to load tokenizer: {}", e);
            anyhow::anyhow!("Failed to load tokenizer: {}", e)
        })?;

        info!(target: TARGET_VECTOR, "Successfully loaded E5 model and tokenizer");
        Ok(BertEmbedder {
            model,
            tokenizer,
            config,
        })
    }
}

impl Embedder for BertEmbedder {
    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let start_time = Instant::now();
        let device = &self.config.device;

        // E5 expects a role prefix; articles are compared symmetrically
        let prefixed_text = format!("query: {}", text);
        let encoding = self
            .tokenizer
            .encode(prefixed_text.as_str(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        // Truncate to max_length - 1 to avoid index boundary issues
        let max_len = self.config.max_length - 1;
        let input_ids: Vec<u32> = encoding.get_ids().iter().take(max_len).copied().collect();
        let attention_mask: Vec<u32> = encoding
            .get_attention_mask()
            .iter()
            .take(max_len)
            .copied()
            .collect();
        let token_count = input_ids.len();

        let input_ids = Tensor::new(input_ids, device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(attention_mask, device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden_state = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Zero out padding positions, then average over valid tokens
        let mask = attention_mask.to_dtype(DType::F32)?;
        let summed = hidden_state.broadcast_mul(&mask.unsqueeze(2)?)?.sum(1)?;
        let counts = mask.sum_keepdim(1)?.clamp(1.0f32, f32::MAX)?;
        let mean_pooled = summed.broadcast_div(&counts)?;

        let norm = mean_pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
        let normalized = mean_pooled.broadcast_div(&norm)?;
        let vector = normalized.squeeze(0)?.to_vec1::<f32>()?;

        if vector.len() != self.config.dimensions {
            return Err(anyhow::anyhow!(
                "Unexpected embedding dimensions: got {}, expected {}",
                vector.len(),
                self.config.dimensions
            ));
        }

        debug!(target: TARGET_VECTOR,
            "Embedded {} tokens ({} chars) in {:?}",
            token_count,
            text.len(),
            start_time.elapsed()
        );

        Ok(vector)
    }
}
