use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::similarity::{cosine_similarity, ContentSource};
use super::types::{ScoreVector, SimilarityMode};
use super::TARGET_VECTOR;
use crate::news::Catalog;
use crate::ItemId;

/// Opaque text encoder: one dense vector per input text.
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Precomputed dense embeddings, one row per news item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingBank {
    pub ids: Vec<ItemId>,
    pub vectors: Vec<Vec<f32>>,
}

impl EmbeddingBank {
    /// Embed every catalog item's content, in catalog order.
    pub fn build(catalog: &Catalog, embedder: &dyn Embedder) -> Result<Self> {
        let mut bank = EmbeddingBank::default();
        for (position, item) in catalog.items().iter().enumerate() {
            let vector = embedder
                .embed(&item.content())
                .with_context(|| format!("Failed to embed news item {}", item.id))?;
            bank.ids.push(item.id.clone());
            bank.vectors.push(vector);

            if (position + 1) % 1000 == 0 {
                info!(target: TARGET_VECTOR, "Embedded {}/{} news items", position + 1, catalog.len());
            }
        }
        Ok(bank)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read embedding bank {}", path.display()))?;
        let bank: EmbeddingBank = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse embedding bank {}", path.display()))?;
        if bank.ids.len() != bank.vectors.len() {
            return Err(anyhow::anyhow!(
                "Embedding bank has {} ids but {} vectors",
                bank.ids.len(),
                bank.vectors.len()
            ));
        }
        Ok(bank)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string(self)?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write embedding bank {}", path.display()))
    }

    /// Reorder rows to match `catalog`. Every catalog item must have a row.
    pub fn align(mut self, catalog: &Catalog) -> Result<Self> {
        let mut rows: Vec<Option<Vec<f32>>> = vec![None; catalog.len()];
        for (id, vector) in self.ids.drain(..).zip(self.vectors.drain(..)) {
            if let Some(position) = catalog.position(&id) {
                rows[position] = Some(vector);
            }
        }

        let mut aligned = EmbeddingBank::default();
        for (item, row) in catalog.items().iter().zip(rows) {
            let vector =
                row.ok_or_else(|| anyhow::anyhow!("No embedding for news item {}", item.id))?;
            aligned.ids.push(item.id.clone());
            aligned.vectors.push(vector);
        }
        Ok(aligned)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Dense-embedding content source: embeds the target and scores it by cosine
/// against each catalog row.
pub struct DenseEmbeddingSource {
    bank: EmbeddingBank,
    embedder: Arc<dyn Embedder>,
}

impl DenseEmbeddingSource {
    pub fn new(bank: EmbeddingBank, embedder: Arc<dyn Embedder>) -> Self {
        DenseEmbeddingSource { bank, embedder }
    }
}

impl ContentSource for DenseEmbeddingSource {
    fn mode(&self) -> SimilarityMode {
        SimilarityMode::Bert
    }

    fn content_scores(&self, content: &str) -> Result<ScoreVector> {
        let target = self.embedder.embed(content)?;
        let scores = self
            .bank
            .vectors
            .iter()
            .map(|row| cosine_similarity(&target, row).map(f64::from))
            .collect::<Result<Vec<f64>>>()?;
        Ok(ScoreVector::Dense(scores))
    }
}
