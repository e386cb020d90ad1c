use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::metrics::{ndcg_at_k, precision_at_k, recall_at_k, EvaluationMetrics, EvaluationQuery};
use crate::error::{LookupKind, RecommendError, RecommendResult};
use crate::news::ClickHistories;
use crate::scoring::hybrid::validate_alpha;
use crate::scoring::{round_to, HybridRecommender, SCORE_PRECISION};
use crate::vector::SimilarityMode;
use crate::{ItemId, UserId, TARGET_EVAL};

/// Anything that can turn a probe article into a ranked list of article IDs.
pub trait Recommender: Sync {
    fn recommend_ids(&self, probe: &str, top_k: usize) -> RecommendResult<Vec<ItemId>>;
}

/// A [`HybridRecommender`] pinned to one similarity mode and blend weight.
pub struct HybridRanker<'a> {
    recommender: &'a HybridRecommender,
    mode: SimilarityMode,
    alpha: f64,
}

impl<'a> HybridRanker<'a> {
    pub fn new(
        recommender: &'a HybridRecommender,
        mode: SimilarityMode,
        alpha: f64,
    ) -> RecommendResult<Self> {
        validate_alpha(alpha)?;
        Ok(HybridRanker {
            recommender,
            mode,
            alpha,
        })
    }
}

impl Recommender for HybridRanker<'_> {
    fn recommend_ids(&self, probe: &str, top_k: usize) -> RecommendResult<Vec<ItemId>> {
        Ok(self
            .recommender
            .recommend(probe, self.mode, self.alpha, top_k)?
            .into_iter()
            .map(|r| r.item.id)
            .collect())
    }
}

/// Mean metrics over every user that could be evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub avg_precision: f64,
    pub avg_recall: f64,
    pub avg_ndcg: f64,
    pub users_evaluated: usize,
    pub users_skipped: usize,
}

impl AggregateMetrics {
    /// `None` when there is nothing to average.
    pub fn from_metrics(metrics: &[EvaluationMetrics], users_skipped: usize) -> Option<Self> {
        if metrics.is_empty() {
            return None;
        }
        let n = metrics.len() as f64;
        let (precision, recall, ndcg) = metrics.iter().fold((0.0, 0.0, 0.0), |acc, m| {
            (acc.0 + m.precision, acc.1 + m.recall, acc.2 + m.ndcg)
        });
        Some(AggregateMetrics {
            avg_precision: precision / n,
            avg_recall: recall / n,
            avg_ndcg: ndcg / n,
            users_evaluated: metrics.len(),
            users_skipped,
        })
    }
}

/// Leave-last-out offline evaluation over a set of click histories.
pub struct Evaluator<'a, R> {
    recommender: R,
    histories: &'a ClickHistories,
    k: usize,
}

impl<'a, R: Recommender> Evaluator<'a, R> {
    pub fn new(recommender: R, histories: &'a ClickHistories, k: usize) -> RecommendResult<Self> {
        if k == 0 {
            return Err(RecommendError::InvalidParameter(
                "evaluation cutoff k must be at least 1".to_string(),
            ));
        }
        Ok(Evaluator {
            recommender,
            histories,
            k,
        })
    }

    /// Metrics for one user, or `None` when their history has fewer than two clicks.
    ///
    /// Each metric is rounded to four decimals.
    pub fn evaluate_user(&self, user_id: &str) -> RecommendResult<Option<EvaluationMetrics>> {
        let history = self
            .histories
            .get(user_id)
            .ok_or_else(|| RecommendError::user_not_found(user_id))?;

        let Some(query) = EvaluationQuery::from_history(history) else {
            return Ok(None);
        };

        let recommended = self.recommender.recommend_ids(&query.probe, self.k)?;
        let metrics = EvaluationMetrics {
            precision: round_to(
                precision_at_k(&query.ground_truth, &recommended, self.k),
                SCORE_PRECISION,
            ),
            recall: round_to(
                recall_at_k(&query.ground_truth, &recommended, self.k),
                SCORE_PRECISION,
            ),
            ndcg: round_to(
                ndcg_at_k(&query.ground_truth, &recommended, self.k),
                SCORE_PRECISION,
            ),
        };
        debug!(target: TARGET_EVAL, "User {} probe {}: {:?}", user_id, query.probe, metrics);
        Ok(Some(metrics))
    }

    /// Average metrics over `users`, evaluated in parallel.
    ///
    /// Users whose probe article is missing from the catalog are skipped and
    /// counted; any other error aborts the run.
    pub fn evaluate_users(&self, users: &[UserId]) -> RecommendResult<Option<AggregateMetrics>> {
        let outcomes: Vec<RecommendResult<Option<EvaluationMetrics>>> = users
            .par_iter()
            .map(|user_id| self.evaluate_user(user_id))
            .collect();

        let mut metrics = Vec::with_capacity(outcomes.len());
        let mut skipped = 0;
        for (user_id, outcome) in users.iter().zip(outcomes) {
            match outcome {
                Ok(Some(m)) => metrics.push(m),
                Ok(None) => {}
                Err(RecommendError::NotFound {
                    kind: LookupKind::NewsItem,
                    id,
                }) => {
                    warn!(target: TARGET_EVAL, "Skipping user {}: probe article {} is not in the catalog", user_id, id);
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let aggregate = AggregateMetrics::from_metrics(&metrics, skipped);
        match &aggregate {
            Some(a) => info!(target: TARGET_EVAL,
                "Evaluated {} of {} users at k={}: precision={:.4} recall={:.4} ndcg={:.4}",
                a.users_evaluated, users.len(), self.k, a.avg_precision, a.avg_recall, a.avg_ndcg
            ),
            None => info!(target: TARGET_EVAL, "No evaluable users among {} requested", users.len()),
        }
        Ok(aggregate)
    }

    /// Average metrics over every user with at least two clicks.
    pub fn evaluate_all(&self) -> RecommendResult<Option<AggregateMetrics>> {
        let users: Vec<UserId> = self.histories.keys().cloned().collect();
        self.evaluate_users(&users)
    }
}

/// Seeded random subset of up to `n` evaluable users, in sorted order.
///
/// Only users with at least two clicks are eligible. The same seed over the
/// same histories always returns the same users.
pub fn sample_users(histories: &ClickHistories, n: usize, seed: u64) -> Vec<UserId> {
    let eligible: Vec<&UserId> = histories
        .iter()
        .filter(|(_, clicks)| clicks.len() >= 2)
        .map(|(user_id, _)| user_id)
        .collect();

    if n >= eligible.len() {
        return eligible.into_iter().cloned().collect();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = index::sample(&mut rng, eligible.len(), n).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| eligible[i].clone()).collect()
}
