pub mod app;
pub mod assets;
pub mod collab;
pub mod environment;
pub mod error;
pub mod evaluation;
pub mod logging;
pub mod news;
pub mod scoring;
pub mod vector;

pub use collab::ItemSimilarityTable;
pub use error::{RecommendError, RecommendResult};
pub use evaluation::{AggregateMetrics, EvaluationMetrics, Evaluator, HybridRanker};
pub use news::{Catalog, ClickHistories, NewsItem};
pub use scoring::{HybridRecommender, Recommendation};
pub use vector::{ContentSource, ScoreVector, SimilarityMode};

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_SCORING: &str = "scoring";
pub const TARGET_EVAL: &str = "evaluation";

/// Identifier of a news article, e.g. `N55528`.
pub type ItemId = String;

/// Identifier of a user in the click logs, e.g. `U13740`.
pub type UserId = String;
