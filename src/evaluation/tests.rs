use std::collections::HashMap;
use std::sync::Arc;

use super::*;
use crate::collab::ItemSimilarityTable;
use crate::error::{LookupKind, RecommendError, RecommendResult};
use crate::news::{Catalog, ClickHistories, NewsItem};
use crate::scoring::HybridRecommender;
use crate::vector::{ContentSource, ScoreVector, SimilarityMode};
use crate::ItemId;

/// Returns a canned list per probe; unknown probes are missing from the catalog.
struct CannedRecommender {
    lists: HashMap<&'static str, Vec<&'static str>>,
}

impl Recommender for CannedRecommender {
    fn recommend_ids(&self, probe: &str, top_k: usize) -> RecommendResult<Vec<ItemId>> {
        let list = self
            .lists
            .get(probe)
            .ok_or_else(|| RecommendError::item_not_found(probe))?;
        Ok(list.iter().take(top_k).map(|s| s.to_string()).collect())
    }
}

struct BrokenRecommender;

impl Recommender for BrokenRecommender {
    fn recommend_ids(&self, _probe: &str, _top_k: usize) -> RecommendResult<Vec<ItemId>> {
        Err(RecommendError::UpstreamFailure(anyhow::anyhow!(
            "embedding service unavailable"
        )))
    }
}

fn histories(entries: &[(&str, &str)]) -> ClickHistories {
    entries
        .iter()
        .map(|(user, clicks)| {
            (
                user.to_string(),
                clicks.split_whitespace().map(|s| s.to_string()).collect(),
            )
        })
        .collect()
}

fn canned() -> CannedRecommender {
    let mut lists = HashMap::new();
    lists.insert("C", vec!["A", "X", "B", "Y"]);
    lists.insert("D", vec!["X", "Y", "Z", "B"]);
    CannedRecommender { lists }
}

#[test]
fn test_evaluate_user() {
    let histories = histories(&[("U1", "A B C")]);
    let evaluator = Evaluator::new(canned(), &histories, 4).unwrap();

    let metrics = evaluator.evaluate_user("U1").unwrap().unwrap();
    assert_eq!(metrics.precision, 0.5);
    assert_eq!(metrics.recall, 1.0);
    assert_eq!(metrics.ndcg, 0.9197);
}

#[test]
fn test_repeated_clicks_are_kept_in_ground_truth() {
    let histories = histories(&[("U1", "A A B C")]);
    let evaluator = Evaluator::new(canned(), &histories, 4).unwrap();

    let metrics = evaluator.evaluate_user("U1").unwrap().unwrap();
    assert_eq!(metrics.precision, 0.5);
    assert_eq!(metrics.recall, 0.6667);
    assert_eq!(metrics.ndcg, 0.7039);
}

#[test]
fn test_short_histories_are_not_evaluated() {
    let histories = histories(&[("U1", "A B C"), ("U2", "A"), ("U3", "")]);
    let evaluator = Evaluator::new(canned(), &histories, 4).unwrap();

    assert!(evaluator.evaluate_user("U2").unwrap().is_none());
    assert!(evaluator.evaluate_user("U3").unwrap().is_none());

    let aggregate = evaluator.evaluate_all().unwrap().unwrap();
    assert_eq!(aggregate.users_evaluated, 1);
    assert_eq!(aggregate.users_skipped, 0);
    assert_eq!(aggregate.avg_ndcg, 0.9197);
}

#[test]
fn test_evaluate_all_averages_users() {
    let histories = histories(&[("U1", "A B C"), ("U4", "B D")]);
    let evaluator = Evaluator::new(canned(), &histories, 4).unwrap();

    let u4 = evaluator.evaluate_user("U4").unwrap().unwrap();
    assert_eq!(u4.precision, 0.25);
    assert_eq!(u4.recall, 1.0);
    assert_eq!(u4.ndcg, 0.4307);

    let aggregate = evaluator.evaluate_all().unwrap().unwrap();
    assert_eq!(aggregate.users_evaluated, 2);
    assert!((aggregate.avg_precision - 0.375).abs() < 1e-12);
    assert!((aggregate.avg_recall - 1.0).abs() < 1e-12);
    assert!((aggregate.avg_ndcg - (0.9197 + 0.4307) / 2.0).abs() < 1e-12);
}

#[test]
fn test_no_evaluable_users_yields_none() {
    let empty = ClickHistories::new();
    let evaluator = Evaluator::new(canned(), &empty, 5).unwrap();
    assert!(evaluator.evaluate_all().unwrap().is_none());

    let singles = histories(&[("U1", "A"), ("U2", "B")]);
    let evaluator = Evaluator::new(canned(), &singles, 5).unwrap();
    assert!(evaluator.evaluate_all().unwrap().is_none());
}

#[test]
fn test_unknown_user_is_not_found() {
    let histories = histories(&[("U1", "A B C")]);
    let evaluator = Evaluator::new(canned(), &histories, 4).unwrap();
    match evaluator.evaluate_user("U9") {
        Err(RecommendError::NotFound { kind, id }) => {
            assert_eq!(kind, LookupKind::User);
            assert_eq!(id, "U9");
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_probe_outside_catalog_is_skipped() {
    let histories = histories(&[("U1", "A B C"), ("U2", "A Q")]);
    let evaluator = Evaluator::new(canned(), &histories, 4).unwrap();

    let aggregate = evaluator.evaluate_all().unwrap().unwrap();
    assert_eq!(aggregate.users_evaluated, 1);
    assert_eq!(aggregate.users_skipped, 1);
}

#[test]
fn test_upstream_failure_aborts_evaluation() {
    let histories = histories(&[("U1", "A B C")]);
    let evaluator = Evaluator::new(BrokenRecommender, &histories, 4).unwrap();
    assert!(matches!(
        evaluator.evaluate_all(),
        Err(RecommendError::UpstreamFailure(_))
    ));
}

#[test]
fn test_zero_cutoff_is_rejected() {
    let histories = histories(&[("U1", "A B C")]);
    assert!(matches!(
        Evaluator::new(canned(), &histories, 0),
        Err(RecommendError::InvalidParameter(_))
    ));
}

#[test]
fn test_sample_users_is_seeded() {
    let histories = histories(&[
        ("U1", "A B"),
        ("U2", "A B C"),
        ("U3", "A"),
        ("U4", "C D"),
        ("U5", "B D"),
        ("U6", "D A"),
    ]);

    let first = sample_users(&histories, 3, 42);
    assert_eq!(first.len(), 3);
    assert_eq!(first, sample_users(&histories, 3, 42));
    assert!(!first.contains(&"U3".to_string()));
    assert!(first.windows(2).all(|w| w[0] < w[1]));

    let all = sample_users(&histories, 100, 7);
    assert_eq!(all, vec!["U1", "U2", "U4", "U5", "U6"]);
}

struct ZeroSource {
    len: usize,
}

impl ContentSource for ZeroSource {
    fn mode(&self) -> SimilarityMode {
        SimilarityMode::Tfidf
    }

    fn content_scores(&self, _content: &str) -> anyhow::Result<ScoreVector> {
        Ok(ScoreVector::zeros(self.len))
    }
}

fn hybrid() -> HybridRecommender {
    let items = (0..4)
        .map(|i| NewsItem::new(&format!("N{}", i), "news", "newsworld", &format!("Title {}", i), ""))
        .collect();
    let catalog = Arc::new(Catalog::new(items).unwrap());

    let mut table = ItemSimilarityTable::new();
    table.insert("N0", "N1", 0.9);
    table.insert("N0", "N2", 0.8);

    HybridRecommender::new(catalog, Arc::new(table)).with_source(Arc::new(ZeroSource { len: 4 }))
}

#[test]
fn test_hybrid_ranker_end_to_end() {
    let recommender = hybrid();
    let histories = histories(&[("U1", "N1 N2 N0")]);
    let ranker = HybridRanker::new(&recommender, SimilarityMode::Tfidf, 0.0).unwrap();
    let evaluator = Evaluator::new(ranker, &histories, 2).unwrap();

    let metrics = evaluator.evaluate_user("U1").unwrap().unwrap();
    assert_eq!(
        metrics,
        EvaluationMetrics {
            precision: 1.0,
            recall: 1.0,
            ndcg: 1.0
        }
    );
}

#[test]
fn test_hybrid_ranker_rejects_bad_alpha() {
    let recommender = hybrid();
    assert!(matches!(
        HybridRanker::new(&recommender, SimilarityMode::Tfidf, 1.5),
        Err(RecommendError::InvalidParameter(_))
    ));
}
