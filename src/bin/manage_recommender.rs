use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use newsrec::assets::load_assets;
use newsrec::collab::ItemSimilarityTable;
use newsrec::environment::Config;
use newsrec::evaluation::{sample_users, Evaluator, HybridRanker};
use newsrec::news::{load_click_histories, load_news_tsv};
use newsrec::vector::{SimilarityMode, TfidfSource};
use newsrec::{UserId, TARGET_EVAL};
use prettytable::{Cell, Row, Table};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[clap(name = "manage-recommender", about = "Inspect, evaluate and precompute the news recommender")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a single news item
    Show {
        /// News ID, e.g. N55528
        #[clap(required = true)]
        id: String,
    },

    /// Hybrid content + collaborative recommendations for an article
    Recommend {
        #[clap(required = true)]
        id: String,

        /// Content similarity model (bert, tfidf)
        #[clap(short, long, default_value = "tfidf")]
        model: String,

        /// Weight of content similarity (0.0-1.0)
        #[clap(short, long, default_value = "0.5")]
        alpha: f64,

        /// Number of recommendations
        #[clap(short, long, default_value = "10")]
        topk: usize,
    },

    /// Articles ranked by content similarity alone
    Similar {
        #[clap(required = true)]
        id: String,

        #[clap(short, long, default_value = "tfidf")]
        model: String,

        #[clap(short, long, default_value = "10")]
        topk: usize,
    },

    /// Offline precision/recall/NDCG over user click histories
    Evaluate {
        #[clap(short, long, default_value = "tfidf")]
        model: String,

        #[clap(short, long, default_value = "0.5")]
        alpha: f64,

        /// Cutoff K for the metrics
        #[clap(short, long, default_value = "10")]
        topk: usize,

        /// Evaluate a seeded sample of this many users instead of all of them
        #[clap(short, long)]
        n_users: Option<usize>,

        #[clap(short, long, default_value = "42")]
        seed: u64,
    },

    /// Precompute the item-item collaborative table from behaviors.tsv
    BuildCf {
        /// Where to write the table (JSON)
        #[clap(short, long)]
        output: PathBuf,
    },

    /// Fit the TF-IDF vocabulary on news.tsv
    FitTfidf {
        /// Where to write the vectorizer (JSON)
        #[clap(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    newsrec::logging::setup_logging(Level::INFO)?;

    let args = Cli::parse();
    let config = Config::from_env();

    match args.command {
        Commands::Show { id } => show_item(&config, &id)?,
        Commands::Recommend {
            id,
            model,
            alpha,
            topk,
        } => recommend(config, &id, parse_mode(&model)?, alpha, topk).await?,
        Commands::Similar { id, model, topk } => {
            similar(config, &id, parse_mode(&model)?, topk).await?
        }
        Commands::Evaluate {
            model,
            alpha,
            topk,
            n_users,
            seed,
        } => evaluate(config, parse_mode(&model)?, alpha, topk, n_users, seed).await?,
        Commands::BuildCf { output } => build_cf(&config, &output)?,
        Commands::FitTfidf { output } => fit_tfidf(&config, &output)?,
    }

    Ok(())
}

fn parse_mode(raw: &str) -> Result<SimilarityMode> {
    raw.parse::<SimilarityMode>().map_err(|e| anyhow!(e))
}

/// Load only the requested content mode.
fn with_mode(mut config: Config, mode: SimilarityMode) -> Config {
    config.modes = vec![mode];
    config
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

fn show_item(config: &Config, id: &str) -> Result<()> {
    let catalog = load_news_tsv(&config.news_path)?;
    let item = catalog
        .get(id)
        .ok_or_else(|| anyhow!("News item {} not found", id))?;

    let mut table = Table::new();
    for (field, value) in [
        ("News ID", item.id.as_str()),
        ("Category", item.category.as_str()),
        ("Subcategory", item.subcategory.as_str()),
        ("Title", item.title.as_str()),
        ("Abstract", item.abstract_text.as_str()),
        ("Url", item.url.as_str()),
    ] {
        table.add_row(Row::new(vec![Cell::new(field), Cell::new(value)]));
    }
    table.printstd();
    Ok(())
}

async fn recommend(
    config: Config,
    id: &str,
    mode: SimilarityMode,
    alpha: f64,
    topk: usize,
) -> Result<()> {
    let assets = load_assets(&with_mode(config, mode)).await?;
    let recommendations = assets.recommender.recommend(id, mode, alpha, topk)?;

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("#"),
        Cell::new("News ID"),
        Cell::new("Category"),
        Cell::new("Title"),
        Cell::new("Content"),
        Cell::new("CF"),
        Cell::new("Hybrid"),
    ]));
    for (rank, r) in recommendations.iter().enumerate() {
        table.add_row(Row::new(vec![
            Cell::new(&(rank + 1).to_string()),
            Cell::new(&r.item.id),
            Cell::new(&r.item.category),
            Cell::new(&truncate(&r.item.title, 60)),
            Cell::new(&format!("{:.4}", r.content_score)),
            Cell::new(&format!("{:.4}", r.cf_score)),
            Cell::new(&format!("{:.4}", r.hybrid_score)),
        ]));
    }
    table.printstd();
    Ok(())
}

async fn similar(config: Config, id: &str, mode: SimilarityMode, topk: usize) -> Result<()> {
    let assets = load_assets(&with_mode(config, mode)).await?;
    let similar = assets.recommender.recommend_by_content(id, mode, topk)?;

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("#"),
        Cell::new("News ID"),
        Cell::new("Category"),
        Cell::new("Title"),
        Cell::new("Similarity"),
    ]));
    for (rank, s) in similar.iter().enumerate() {
        table.add_row(Row::new(vec![
            Cell::new(&(rank + 1).to_string()),
            Cell::new(&s.item.id),
            Cell::new(&s.item.category),
            Cell::new(&truncate(&s.item.title, 60)),
            Cell::new(&format!("{:.4}", s.similarity)),
        ]));
    }
    table.printstd();
    Ok(())
}

async fn evaluate(
    config: Config,
    mode: SimilarityMode,
    alpha: f64,
    topk: usize,
    n_users: Option<usize>,
    seed: u64,
) -> Result<()> {
    let assets = load_assets(&with_mode(config, mode)).await?;
    let users: Vec<UserId> = match n_users {
        Some(n) => sample_users(&assets.histories, n, seed),
        None => assets.histories.keys().cloned().collect(),
    };
    info!(target: TARGET_EVAL, "Evaluating {} users with mode={} alpha={} k={}", users.len(), mode, alpha, topk);

    let ranker = HybridRanker::new(&assets.recommender, mode, alpha)?;
    let evaluator = Evaluator::new(ranker, &assets.histories, topk)?;
    let Some(metrics) = evaluator.evaluate_users(&users)? else {
        println!("No users with at least two clicks to evaluate");
        return Ok(());
    };

    let mut table = Table::new();
    table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));
    table.add_row(Row::new(vec![
        Cell::new(&format!("Precision@{}", topk)),
        Cell::new(&format!("{:.4}", metrics.avg_precision)),
    ]));
    table.add_row(Row::new(vec![
        Cell::new(&format!("Recall@{}", topk)),
        Cell::new(&format!("{:.4}", metrics.avg_recall)),
    ]));
    table.add_row(Row::new(vec![
        Cell::new(&format!("NDCG@{}", topk)),
        Cell::new(&format!("{:.4}", metrics.avg_ndcg)),
    ]));
    table.add_row(Row::new(vec![
        Cell::new("Users evaluated"),
        Cell::new(&metrics.users_evaluated.to_string()),
    ]));
    table.add_row(Row::new(vec![
        Cell::new("Users skipped"),
        Cell::new(&metrics.users_skipped.to_string()),
    ]));
    table.printstd();
    Ok(())
}

fn build_cf(config: &Config, output: &Path) -> Result<()> {
    let histories = load_click_histories(&config.behaviors_path)?;
    let table = ItemSimilarityTable::from_click_histories(&histories);
    table
        .save(output)
        .with_context(|| format!("Failed to write item similarity to {}", output.display()))?;
    println!(
        "Wrote item similarity for {} items from {} users to {}",
        table.item_count(),
        histories.len(),
        output.display()
    );
    Ok(())
}

fn fit_tfidf(config: &Config, output: &Path) -> Result<()> {
    let catalog = load_news_tsv(&config.news_path)?;
    let source = TfidfSource::fit(&catalog);
    source
        .vectorizer()
        .save(output)
        .with_context(|| format!("Failed to write vectorizer to {}", output.display()))?;
    println!(
        "Fitted {} terms over {} articles, saved to {}",
        source.vectorizer().vocabulary_size(),
        catalog.len(),
        output.display()
    );
    Ok(())
}
