//! Start-up loading of the catalog, click logs and similarity sources.
//!
//! Precomputed artifacts are read when their path is configured and present;
//! otherwise they are derived from the catalog or click logs and, when a path
//! is configured, written back for the next start.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::collab::{ItemSimilarityTable, TARGET_COLLAB};
use crate::environment::Config;
use crate::news::{load_click_histories, load_news_tsv, Catalog, ClickHistories};
use crate::scoring::HybridRecommender;
use crate::vector::{
    BertEmbedder, ContentSource, DenseEmbeddingSource, E5Config, EmbeddingBank, SimilarityMode,
    TfidfSource, TfidfVectorizer, TARGET_VECTOR,
};

/// Everything a running recommender needs, loaded once.
pub struct Assets {
    pub histories: Arc<ClickHistories>,
    pub recommender: Arc<HybridRecommender>,
}

pub async fn load_assets(config: &Config) -> Result<Assets> {
    let catalog = Arc::new(load_news_tsv(&config.news_path)?);
    let histories = Arc::new(load_click_histories(&config.behaviors_path)?);

    let table = load_item_similarity(config.item_sim_path.as_deref(), &histories)?;

    let mut recommender = HybridRecommender::new(Arc::clone(&catalog), Arc::new(table));
    for mode in &config.modes {
        let source: Arc<dyn ContentSource> = match mode {
            SimilarityMode::Tfidf => Arc::new(load_tfidf(config.tfidf_path.as_deref(), &catalog)?),
            SimilarityMode::Bert => Arc::new(load_dense(config, &catalog).await?),
        };
        recommender = recommender.with_source(source);
    }

    Ok(Assets {
        histories,
        recommender: Arc::new(recommender),
    })
}

/// Read a precomputed item-item table, or derive one from click co-occurrence.
pub fn load_item_similarity(
    path: Option<&Path>,
    histories: &ClickHistories,
) -> Result<ItemSimilarityTable> {
    if let Some(path) = path.filter(|p| p.exists()) {
        let table = ItemSimilarityTable::load(path)?;
        info!(target: TARGET_COLLAB, "Loaded item similarity for {} items from {}", table.item_count(), path.display());
        return Ok(table);
    }

    let table = ItemSimilarityTable::from_click_histories(histories);
    if let Some(path) = path {
        table.save(path)?;
    }
    Ok(table)
}

/// Read a fitted vectorizer, or fit one on the catalog.
pub fn load_tfidf(path: Option<&Path>, catalog: &Catalog) -> Result<TfidfSource> {
    if let Some(path) = path.filter(|p| p.exists()) {
        let vectorizer = TfidfVectorizer::load(path)?;
        info!(target: TARGET_VECTOR, "Loaded TF-IDF vocabulary of {} terms from {}", vectorizer.vocabulary_size(), path.display());
        return Ok(TfidfSource::build(catalog, vectorizer));
    }

    let source = TfidfSource::fit(catalog);
    if let Some(path) = path {
        source.vectorizer().save(path)?;
    }
    Ok(source)
}

/// Load the E5 encoder and an embedding bank aligned with the catalog.
pub async fn load_dense(config: &Config, catalog: &Catalog) -> Result<DenseEmbeddingSource> {
    let e5 = E5Config::with_paths(&config.model_path, &config.tokenizer_path);
    e5.ensure_models_exist()
        .await
        .context("Failed to fetch E5 model files")?;
    let embedder = Arc::new(BertEmbedder::load(e5)?);

    let bank = match config.embeddings_path.as_deref() {
        Some(path) if path.exists() => EmbeddingBank::load(path)?.align(catalog)?,
        path => {
            info!(target: TARGET_VECTOR, "Embedding {} catalog items", catalog.len());
            let bank = EmbeddingBank::build(catalog, embedder.as_ref())?;
            if let Some(path) = path {
                bank.save(path)?;
            }
            bank
        }
    };

    Ok(DenseEmbeddingSource::new(bank, embedder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::NewsItem;
    use tempfile::tempdir;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            NewsItem::new("N1", "sports", "golf", "Golf major finishes in playoff", ""),
            NewsItem::new("N2", "finance", "markets", "Markets rally on rate cut", ""),
        ])
        .unwrap()
    }

    #[test]
    fn test_item_similarity_is_cached() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("item_sim.json");

        let mut histories = ClickHistories::new();
        histories.insert("U1".into(), vec!["N1".into(), "N2".into()]);

        let built = load_item_similarity(Some(path.as_path()), &histories).unwrap();
        assert!(path.exists());

        let loaded = load_item_similarity(Some(path.as_path()), &ClickHistories::new()).unwrap();
        assert!(built.affinity("N1", "N2") > 0.0);
        assert!((loaded.affinity("N1", "N2") - built.affinity("N1", "N2")).abs() < 1e-12);
    }

    #[test]
    fn test_tfidf_is_cached() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tfidf.json");
        let catalog = catalog();

        let fitted = load_tfidf(Some(path.as_path()), &catalog).unwrap();
        assert!(path.exists());

        let loaded = load_tfidf(Some(path.as_path()), &catalog).unwrap();
        assert_eq!(
            loaded.vectorizer().vocabulary_size(),
            fitted.vectorizer().vocabulary_size()
        );
    }
}
