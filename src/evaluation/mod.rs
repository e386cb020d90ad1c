pub mod evaluator;
pub mod metrics;
#[cfg(test)]
mod tests;

pub use evaluator::{sample_users, AggregateMetrics, Evaluator, HybridRanker, Recommender};
pub use metrics::{ndcg_at_k, precision_at_k, recall_at_k, EvaluationMetrics, EvaluationQuery};
