use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

use crate::environment::Config;
use crate::error::RecommendError;
use crate::news::ClickHistories;
use crate::scoring::HybridRecommender;
use crate::vector::SimilarityMode;
use crate::TARGET_WEB_REQUEST;

pub mod api;

pub use api::{app_api_loop, router};

/// Shared, read-only state behind every request.
pub struct AppState {
    pub recommender: Arc<HybridRecommender>,
    pub histories: Arc<ClickHistories>,
    pub default_mode: SimilarityMode,
    pub default_alpha: f64,
    pub default_topk: usize,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        recommender: Arc<HybridRecommender>,
        histories: Arc<ClickHistories>,
        config: &Config,
    ) -> Self {
        let default_mode = config
            .modes
            .first()
            .copied()
            .unwrap_or(SimilarityMode::Tfidf);
        AppState {
            recommender,
            histories,
            default_mode,
            default_alpha: config.default_alpha,
            default_topk: config.default_topk,
            started_at: Utc::now(),
        }
    }
}

/// Error returned from handlers, rendered as `{"detail": ...}`.
#[derive(Debug)]
pub enum ApiError {
    Recommend(RecommendError),
    Internal(String),
}

impl From<RecommendError> for ApiError {
    fn from(e: RecommendError) -> Self {
        ApiError::Recommend(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Recommend(RecommendError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Recommend(RecommendError::InvalidParameter(_)) => StatusCode::BAD_REQUEST,
            ApiError::Recommend(RecommendError::UpstreamFailure(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Recommend(e) => e.to_string(),
            ApiError::Internal(msg) => msg.clone(),
        };
        if status.is_server_error() {
            error!(target: TARGET_WEB_REQUEST, "Request failed ({}): {}", status, detail);
        } else {
            warn!(target: TARGET_WEB_REQUEST, "Request rejected ({}): {}", status, detail);
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
