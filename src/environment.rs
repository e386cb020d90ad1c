use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

use crate::vector::SimilarityMode;

/// Retrieves an environment variable and splits it into a vector of strings based on a delimiter.
///
/// Empty segments are dropped, so an unset variable yields an empty vector.
///
/// # Arguments
/// - `var`: The name of the environment variable.
/// - `delimiter`: The character to split the environment variable's value by.
pub fn get_env_var_as_vec(var: &str, delimiter: char) -> Vec<String> {
    env::var(var)
        .unwrap_or_default()
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parses an environment variable, falling back to `default` when unset or malformed.
fn parse_env_or<T: FromStr + Copy + std::fmt::Display>(var: &str, default: T) -> T {
    match env::var(var) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("Invalid value '{}' for {}, using default {}", raw, var, default);
                default
            }
        },
        Err(_) => default,
    }
}

fn optional_path(var: &str) -> Option<PathBuf> {
    env::var(var)
        .ok()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

/// Runtime configuration, read from `NEWSREC_*` environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    pub news_path: PathBuf,
    pub behaviors_path: PathBuf,
    pub item_sim_path: Option<PathBuf>,
    pub tfidf_path: Option<PathBuf>,
    pub embeddings_path: Option<PathBuf>,
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub modes: Vec<SimilarityMode>,
    pub port: u16,
    pub default_alpha: f64,
    pub default_topk: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            news_path: PathBuf::from("model_assets/news.tsv"),
            behaviors_path: PathBuf::from("model_assets/behaviors.tsv"),
            item_sim_path: None,
            tfidf_path: None,
            embeddings_path: None,
            model_path: PathBuf::from("models/e5-large-v2.safetensors"),
            tokenizer_path: PathBuf::from("models/e5-tokenizer.json"),
            modes: vec![SimilarityMode::Tfidf],
            port: 8000,
            default_alpha: 0.5,
            default_topk: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let mut modes = Vec::new();
        for raw in get_env_var_as_vec("NEWSREC_MODES", ';') {
            match raw.parse::<SimilarityMode>() {
                Ok(mode) if !modes.contains(&mode) => modes.push(mode),
                Ok(_) => {}
                Err(e) => warn!("Ignoring NEWSREC_MODES entry: {}", e),
            }
        }
        if modes.is_empty() {
            modes = defaults.modes.clone();
        }

        Self {
            news_path: optional_path("NEWSREC_NEWS_PATH").unwrap_or(defaults.news_path),
            behaviors_path: optional_path("NEWSREC_BEHAVIORS_PATH")
                .unwrap_or(defaults.behaviors_path),
            item_sim_path: optional_path("NEWSREC_ITEM_SIM_PATH"),
            tfidf_path: optional_path("NEWSREC_TFIDF_PATH"),
            embeddings_path: optional_path("NEWSREC_EMBEDDINGS_PATH"),
            model_path: optional_path("NEWSREC_MODEL_PATH").unwrap_or(defaults.model_path),
            tokenizer_path: optional_path("NEWSREC_TOKENIZER_PATH")
                .unwrap_or(defaults.tokenizer_path),
            modes,
            port: parse_env_or("PORT", defaults.port),
            default_alpha: parse_env_or("NEWSREC_DEFAULT_ALPHA", defaults.default_alpha),
            default_topk: parse_env_or("NEWSREC_DEFAULT_TOPK", defaults.default_topk),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment variables are process-wide; each test uses its own names.
    #[test]
    fn test_env_var_as_vec_drops_empty_segments() {
        env::set_var("NEWSREC_TEST_LIST", " bert ; ;tfidf;");
        assert_eq!(
            get_env_var_as_vec("NEWSREC_TEST_LIST", ';'),
            vec!["bert".to_string(), "tfidf".to_string()]
        );
        assert!(get_env_var_as_vec("NEWSREC_TEST_UNSET_LIST", ';').is_empty());
    }

    #[test]
    fn test_parse_env_falls_back_on_garbage() {
        env::set_var("NEWSREC_TEST_ALPHA", "not-a-number");
        assert_eq!(parse_env_or("NEWSREC_TEST_ALPHA", 0.5_f64), 0.5);
        env::set_var("NEWSREC_TEST_TOPK", " 25 ");
        assert_eq!(parse_env_or("NEWSREC_TEST_TOPK", 10_usize), 25);
    }
}
