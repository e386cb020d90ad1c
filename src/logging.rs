use std::io;
use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_STDOUT_FILTER: &str = "info,web_request=info,scoring=warn,evaluation=info";
const DEFAULT_FILE_FILTER: &str = "info,scoring=debug,evaluation=debug";

/// Configure logging for the long-running API server.
///
/// Stdout honours `RUST_LOG` when set, the daily file log under `logs/`
/// always records scoring and evaluation detail at debug level.
pub fn configure_logging() {
    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDOUT_FILTER));

    let stdout_log = fmt::layer()
        .with_writer(io::stdout)
        .with_filter(stdout_filter);

    let file_appender = rolling::daily("logs", "newsrec.log");
    let file_log = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(EnvFilter::new(DEFAULT_FILE_FILTER));

    tracing_subscriber::Registry::default()
        .with(stdout_log)
        .with(file_log)
        .init();
}

/// Simple stdout logging for one-shot command line utilities.
pub fn setup_logging(level: Level) -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set default subscriber: {}", e))
}
