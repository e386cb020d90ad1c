pub mod hybrid;
pub mod normalize;

pub use hybrid::{HybridRecommender, Recommendation, SimilarArticle};
pub use normalize::{normalize, round_to, NORMALIZE_EPSILON, SCORE_PRECISION};
