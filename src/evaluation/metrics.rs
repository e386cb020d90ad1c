//! Ranking-quality metrics over a single recommendation list.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

use crate::ItemId;

/// Per-user ranking quality at a fixed cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub precision: f64,
    pub recall: f64,
    pub ndcg: f64,
}

/// A click history split into a probe item and the earlier clicks to predict.
///
/// `ground_truth` keeps every earlier click in order, repeats included. Its
/// length is the recall denominator and bounds the ideal DCG.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationQuery {
    pub probe: ItemId,
    pub ground_truth: Vec<ItemId>,
}

impl EvaluationQuery {
    /// The last click becomes the probe; earlier clicks are the ground truth.
    ///
    /// Histories with fewer than two clicks carry no ground truth and yield `None`.
    pub fn from_history(history: &[ItemId]) -> Option<Self> {
        let (probe, earlier) = history.split_last()?;
        if earlier.is_empty() {
            return None;
        }
        Some(EvaluationQuery {
            probe: probe.clone(),
            ground_truth: earlier.to_vec(),
        })
    }
}

fn relevant<T: Eq + Hash>(ground_truth: &[T]) -> HashSet<&T> {
    ground_truth.iter().collect()
}

fn hits_at_k<T: Eq + Hash>(ground_truth: &[T], recommended: &[T], k: usize) -> usize {
    let relevant = relevant(ground_truth);
    recommended
        .iter()
        .take(k)
        .collect::<HashSet<_>>()
        .into_iter()
        .filter(|item| relevant.contains(item))
        .count()
}

/// Fraction of the `k` slots filled by relevant items.
pub fn precision_at_k<T: Eq + Hash>(ground_truth: &[T], recommended: &[T], k: usize) -> f64 {
    if ground_truth.is_empty() || k == 0 {
        return 0.0;
    }
    hits_at_k(ground_truth, recommended, k) as f64 / k as f64
}

/// Fraction of relevant items found in the top `k`.
pub fn recall_at_k<T: Eq + Hash>(ground_truth: &[T], recommended: &[T], k: usize) -> f64 {
    if ground_truth.is_empty() {
        return 0.0;
    }
    hits_at_k(ground_truth, recommended, k) as f64 / ground_truth.len() as f64
}

/// Binary-relevance normalized discounted cumulative gain over the top `k`.
pub fn ndcg_at_k<T: Eq + Hash>(ground_truth: &[T], recommended: &[T], k: usize) -> f64 {
    let relevant = relevant(ground_truth);
    let dcg: f64 = recommended
        .iter()
        .take(k)
        .enumerate()
        .filter(|(_, item)| relevant.contains(item))
        .map(|(idx, _)| 1.0 / ((idx + 2) as f64).log2())
        .sum();

    let idcg: f64 = (0..ground_truth.len().min(k))
        .map(|idx| 1.0 / ((idx + 2) as f64).log2())
        .sum();

    if idcg > 0.0 {
        dcg / idcg
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_and_recall() {
        let truth = ["A", "B", "C"];
        let recommended = ["A", "X", "B", "Y", "Z"];
        assert_eq!(precision_at_k(&truth, &recommended, 5), 0.4);
        assert!((recall_at_k(&truth, &recommended, 5) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_precision_divides_by_k_even_for_short_lists() {
        let truth = ["A"];
        assert_eq!(precision_at_k(&truth, &["A"], 4), 0.25);
        assert_eq!(recall_at_k(&truth, &["A"], 4), 1.0);
    }

    #[test]
    fn test_ndcg() {
        let truth = ["A", "C"];
        let ndcg = ndcg_at_k(&truth, &["A", "B", "C", "D"], 4);
        let expected = 1.5 / (1.0 + 1.0 / 3f64.log2());
        assert!((ndcg - expected).abs() < 1e-12);
        assert!((ndcg - 0.9197).abs() < 1e-4);

        assert_eq!(ndcg_at_k(&truth, &["A", "C"], 4), 1.0);
        assert_eq!(ndcg_at_k(&truth, &["X", "Y"], 4), 0.0);
    }

    #[test]
    fn test_metrics_only_look_at_top_k() {
        let truth = ["C"];
        let recommended = ["A", "B", "C"];
        assert_eq!(precision_at_k(&truth, &recommended, 2), 0.0);
        assert_eq!(recall_at_k(&truth, &recommended, 2), 0.0);
        assert_eq!(ndcg_at_k(&truth, &recommended, 2), 0.0);
    }

    #[test]
    fn test_empty_ground_truth_scores_zero() {
        let truth: [&str; 0] = [];
        assert_eq!(precision_at_k(&truth, &["A"], 1), 0.0);
        assert_eq!(recall_at_k(&truth, &["A"], 1), 0.0);
        assert_eq!(ndcg_at_k(&truth, &["A"], 1), 0.0);
    }

    #[test]
    fn test_query_from_history() {
        let history: Vec<ItemId> = ["N1", "N2", "N1", "N3"].iter().map(|s| s.to_string()).collect();
        let query = EvaluationQuery::from_history(&history).unwrap();
        assert_eq!(query.probe, "N3");
        assert_eq!(query.ground_truth, vec!["N1", "N2", "N1"]);

        assert!(EvaluationQuery::from_history(&history[..1]).is_none());
        assert!(EvaluationQuery::from_history(&[]).is_none());
    }

    #[test]
    fn test_repeated_clicks_count_toward_recall_and_ideal_dcg() {
        let truth = ["A", "A", "B"];
        let recommended = ["A", "X", "B", "Y"];

        assert_eq!(precision_at_k(&truth, &recommended, 4), 0.5);
        assert!((recall_at_k(&truth, &recommended, 4) - 2.0 / 3.0).abs() < 1e-12);

        let expected = 1.5 / (1.0 + 1.0 / 3f64.log2() + 0.5);
        let ndcg = ndcg_at_k(&truth, &recommended, 4);
        assert!((ndcg - expected).abs() < 1e-12);
        assert!((ndcg - 0.7039).abs() < 1e-4);
    }
}
