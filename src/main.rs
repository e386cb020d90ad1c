use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use newsrec::app::{app_api_loop, AppState};
use newsrec::assets::load_assets;
use newsrec::environment::Config;
use newsrec::logging::configure_logging;
use newsrec::TARGET_WEB_REQUEST;

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();

    let config = Config::from_env();
    let modes: Vec<String> = config.modes.iter().map(|m| m.to_string()).collect();
    info!(target: TARGET_WEB_REQUEST,
        "Starting newsrec: news={} behaviors={} modes={}",
        config.news_path.display(),
        config.behaviors_path.display(),
        modes.join(",")
    );

    let assets = load_assets(&config).await?;
    let state = Arc::new(AppState::new(
        assets.recommender,
        assets.histories,
        &config,
    ));

    app_api_loop(state, config.port).await
}
