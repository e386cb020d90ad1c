use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::{ApiError, AppState};
use crate::error::RecommendError;
use crate::evaluation::{sample_users, AggregateMetrics, Evaluator, HybridRanker};
use crate::news::NewsItem;
use crate::scoring::{Recommendation, SimilarArticle};
use crate::vector::SimilarityMode;
use crate::{UserId, TARGET_WEB_REQUEST};

const DEFAULT_EVAL_SEED: u64 = 42;

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    news_items: usize,
    users: usize,
    modes: Vec<SimilarityMode>,
    started_at: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendParams {
    topk: Option<usize>,
    model: Option<String>,
    alpha: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct SimilarParams {
    topk: Option<usize>,
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EvaluateParams {
    model: Option<String>,
    alpha: Option<f64>,
    topk: Option<usize>,
    n_users: Option<usize>,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct EvaluateResponse {
    model: SimilarityMode,
    alpha: f64,
    topk: usize,
    users_requested: usize,
    metrics: Option<AggregateMetrics>,
}

/// Build the API router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(status_check))
        .route("/news/{id}", get(get_news))
        .route("/recommend/{id}", get(recommend))
        .route("/similar/{id}", get(similar))
        .route("/evaluate", post(evaluate))
        .with_state(state)
}

/// Main application loop, serving the recommendation API until ctrl-c.
pub async fn app_api_loop(state: Arc<AppState>, port: u16) -> Result<()> {
    let app = router(state);
    let addr = format!("0.0.0.0:{}", port);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(target: TARGET_WEB_REQUEST, "Server running on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server stopped unexpectedly")?;

    info!(target: TARGET_WEB_REQUEST, "Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        error!(target: TARGET_WEB_REQUEST, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

fn resolve_mode(state: &AppState, model: Option<&str>) -> Result<SimilarityMode, ApiError> {
    match model {
        None => Ok(state.default_mode),
        Some(raw) => raw
            .parse::<SimilarityMode>()
            .map_err(|e| ApiError::Recommend(RecommendError::InvalidParameter(e))),
    }
}

/// Scoring is CPU-bound, so it runs off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, RecommendError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("scoring task failed: {}", e)))?
        .map_err(ApiError::from)
}

async fn status_check(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "OK",
        news_items: state.recommender.catalog().len(),
        users: state.histories.len(),
        modes: state.recommender.modes(),
        started_at: state.started_at.to_rfc3339(),
    })
}

async fn get_news(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<NewsItem>, ApiError> {
    info!(target: TARGET_WEB_REQUEST, "GET /news/{}", id);
    state
        .recommender
        .catalog()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| RecommendError::item_not_found(&id).into())
}

async fn recommend(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<RecommendParams>,
) -> Result<Json<Vec<Recommendation>>, ApiError> {
    let mode = resolve_mode(&state, params.model.as_deref())?;
    let alpha = params.alpha.unwrap_or(state.default_alpha);
    let topk = params.topk.unwrap_or(state.default_topk);
    info!(target: TARGET_WEB_REQUEST,
        "GET /recommend/{} mode={} alpha={} topk={}", id, mode, alpha, topk
    );

    let recommender = Arc::clone(&state.recommender);
    let recommendations =
        run_blocking(move || recommender.recommend(&id, mode, alpha, topk)).await?;
    Ok(Json(recommendations))
}

async fn similar(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<SimilarParams>,
) -> Result<Json<Vec<SimilarArticle>>, ApiError> {
    let mode = resolve_mode(&state, params.model.as_deref())?;
    let topk = params.topk.unwrap_or(state.default_topk);
    info!(target: TARGET_WEB_REQUEST, "GET /similar/{} mode={} topk={}", id, mode, topk);

    let recommender = Arc::clone(&state.recommender);
    let similar = run_blocking(move || recommender.recommend_by_content(&id, mode, topk)).await?;
    Ok(Json(similar))
}

async fn evaluate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EvaluateParams>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let mode = resolve_mode(&state, params.model.as_deref())?;
    let alpha = params.alpha.unwrap_or(state.default_alpha);
    let topk = params.topk.unwrap_or(state.default_topk);
    let seed = params.seed.unwrap_or(DEFAULT_EVAL_SEED);
    info!(target: TARGET_WEB_REQUEST,
        "POST /evaluate mode={} alpha={} topk={} n_users={:?} seed={}",
        mode, alpha, topk, params.n_users, seed
    );

    let users: Vec<UserId> = match params.n_users {
        Some(0) => {
            return Err(RecommendError::InvalidParameter(
                "n_users must be at least 1".to_string(),
            )
            .into())
        }
        Some(n) => sample_users(&state.histories, n, seed),
        None => state.histories.keys().cloned().collect(),
    };
    let users_requested = users.len();

    let recommender = Arc::clone(&state.recommender);
    let histories = Arc::clone(&state.histories);
    let metrics = run_blocking(move || {
        let ranker = HybridRanker::new(&recommender, mode, alpha)?;
        Evaluator::new(ranker, &histories, topk)?.evaluate_users(&users)
    })
    .await?;

    Ok(Json(EvaluateResponse {
        model: mode,
        alpha,
        topk,
        users_requested,
        metrics,
    }))
}
