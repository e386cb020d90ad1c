use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::normalize::{normalize, round_to, SCORE_PRECISION};
use crate::collab::CollaborativeSource;
use crate::error::{RecommendError, RecommendResult};
use crate::news::{Catalog, NewsItem};
use crate::vector::{ContentSource, ScoreVector, SimilarityMode};
use crate::TARGET_SCORING;

/// A recommended article with the scores that ranked it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub item: NewsItem,
    pub content_score: f64,
    pub cf_score: f64,
    pub hybrid_score: f64,
}

/// An article ranked by raw content similarity alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarArticle {
    #[serde(flatten)]
    pub item: NewsItem,
    #[serde(rename = "Similarity")]
    pub similarity: f64,
}

/// Blends content and collaborative-filter similarity into one ranking.
///
/// Holds already-materialized collaborators and never mutates them, so a
/// single instance can serve concurrent requests.
pub struct HybridRecommender {
    catalog: Arc<Catalog>,
    sources: HashMap<SimilarityMode, Arc<dyn ContentSource>>,
    collaborative: Arc<dyn CollaborativeSource>,
}

impl HybridRecommender {
    pub fn new(catalog: Arc<Catalog>, collaborative: Arc<dyn CollaborativeSource>) -> Self {
        HybridRecommender {
            catalog,
            sources: HashMap::new(),
            collaborative,
        }
    }

    /// Register a content source under its own mode, replacing any previous one.
    pub fn with_source(mut self, source: Arc<dyn ContentSource>) -> Self {
        self.sources.insert(source.mode(), source);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn modes(&self) -> Vec<SimilarityMode> {
        let mut modes: Vec<SimilarityMode> = self.sources.keys().copied().collect();
        modes.sort_by_key(|mode| mode.to_string());
        modes
    }

    /// Rank the catalog against `target_id` by `alpha * content + (1 - alpha) * cf`.
    ///
    /// Both score vectors are min-max normalized independently first. A target
    /// without collaborative data gets all-zero CF scores. The target itself
    /// is never recommended. Ties keep catalog order.
    pub fn recommend(
        &self,
        target_id: &str,
        mode: SimilarityMode,
        alpha: f64,
        top_k: usize,
    ) -> RecommendResult<Vec<Recommendation>> {
        validate_alpha(alpha)?;
        validate_top_k(top_k)?;
        let (target_position, target) = self.target(target_id)?;

        let content = self.content_scores(target, mode)?;
        let cf = self
            .collaborative
            .cf_scores(target_id, &self.catalog)
            .map_err(|e| {
                RecommendError::UpstreamFailure(
                    e.context(format!("collaborative scores for {}", target_id)),
                )
            })?;
        let cf = match cf {
            Some(scores) => {
                self.check_alignment(&scores, "collaborative filter")?;
                scores
            }
            None => {
                debug!(target: TARGET_SCORING, "No collaborative data for {}, using zero CF scores", target_id);
                ScoreVector::zeros(self.catalog.len())
            }
        };

        let content = normalize(&content);
        let cf = normalize(&cf);
        let hybrid: Vec<f64> = content
            .iter()
            .zip(&cf)
            .map(|(c, f)| round_to(alpha * c + (1.0 - alpha) * f, SCORE_PRECISION))
            .collect();

        let ranked = rank_positions(&hybrid, target_position, top_k);
        debug!(target: TARGET_SCORING,
            "Hybrid recommendation for {} (mode={}, alpha={}, top_k={}) returned {} items",
            target_id, mode, alpha, top_k, ranked.len()
        );

        Ok(ranked
            .into_iter()
            .filter_map(|position| {
                Some(Recommendation {
                    item: self.catalog.item_at(position)?.clone(),
                    content_score: content[position],
                    cf_score: cf[position],
                    hybrid_score: hybrid[position],
                })
            })
            .collect())
    }

    /// Rank the catalog by raw content similarity to `target_id` alone.
    ///
    /// The target is excluded by identifier, not by assuming it ranks first.
    pub fn recommend_by_content(
        &self,
        target_id: &str,
        mode: SimilarityMode,
        top_k: usize,
    ) -> RecommendResult<Vec<SimilarArticle>> {
        validate_top_k(top_k)?;
        let (target_position, target) = self.target(target_id)?;

        let similarities = self.content_scores(target, mode)?.to_dense();
        let ranked = rank_positions(&similarities, target_position, top_k);

        Ok(ranked
            .into_iter()
            .filter_map(|position| {
                Some(SimilarArticle {
                    item: self.catalog.item_at(position)?.clone(),
                    similarity: round_to(similarities[position], SCORE_PRECISION),
                })
            })
            .collect())
    }

    fn target(&self, target_id: &str) -> RecommendResult<(usize, &NewsItem)> {
        self.catalog
            .position(target_id)
            .and_then(|position| Some((position, self.catalog.item_at(position)?)))
            .ok_or_else(|| RecommendError::item_not_found(target_id))
    }

    fn content_scores(&self, target: &NewsItem, mode: SimilarityMode) -> RecommendResult<ScoreVector> {
        let source = self.sources.get(&mode).ok_or_else(|| {
            RecommendError::InvalidParameter(format!("similarity mode '{}' is not loaded", mode))
        })?;

        let scores = source.content_scores(&target.content()).map_err(|e| {
            RecommendError::UpstreamFailure(
                e.context(format!("{} content scores for {}", mode, target.id)),
            )
        })?;
        self.check_alignment(&scores, "content")?;
        Ok(scores)
    }

    /// Scores must line up with the catalog and be finite.
    fn check_alignment(&self, scores: &ScoreVector, source: &str) -> RecommendResult<()> {
        if scores.len() != self.catalog.len() {
            return Err(RecommendError::UpstreamFailure(anyhow::anyhow!(
                "{} source returned {} scores for a catalog of {} items",
                source,
                scores.len(),
                self.catalog.len()
            )));
        }
        if let Some((position, value)) = scores.first_non_finite() {
            return Err(RecommendError::UpstreamFailure(anyhow::anyhow!(
                "{} source returned non-finite score {} at position {}",
                source,
                value,
                position
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_alpha(alpha: f64) -> RecommendResult<()> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(RecommendError::InvalidParameter(format!(
            "alpha must be within [0, 1], got {}",
            alpha
        )));
    }
    Ok(())
}

pub(crate) fn validate_top_k(top_k: usize) -> RecommendResult<()> {
    if top_k == 0 {
        return Err(RecommendError::InvalidParameter(
            "top_k must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Catalog positions sorted by descending score, skipping `exclude`, truncated to `top_k`.
///
/// The sort is stable, so equal scores keep ascending catalog order.
fn rank_positions(scores: &[f64], exclude: usize, top_k: usize) -> Vec<usize> {
    let mut positions: Vec<usize> = (0..scores.len()).filter(|&p| p != exclude).collect();
    positions.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    positions.truncate(top_k);
    positions
}
