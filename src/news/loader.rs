//! Loaders for the MIND-style `news.tsv` and `behaviors.tsv` files.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

use super::catalog::Catalog;
use super::types::{ClickHistories, NewsItem};
use super::TARGET_NEWS;

// news.tsv: id, category, subcategory, title, abstract, url, title entities, abstract entities
const NEWS_COLUMNS: usize = 8;
// behaviors.tsv: impression id, user id, time, click history, impressions
const BEHAVIOR_HISTORY_COLUMN: usize = 3;

/// Parse news rows from any reader. Missing trailing columns become empty strings.
pub fn parse_news<R: BufRead>(reader: R) -> Result<Vec<NewsItem>> {
    let mut items = Vec::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read news line {}", line_number + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        let mut columns: Vec<&str> = line.splitn(NEWS_COLUMNS, '\t').collect();
        columns.resize(NEWS_COLUMNS, "");

        let id = columns[0].trim();
        if id.is_empty() {
            warn!(target: TARGET_NEWS, "Skipping news line {} with empty id", line_number + 1);
            continue;
        }

        items.push(NewsItem {
            id: id.to_string(),
            category: columns[1].to_string(),
            subcategory: columns[2].to_string(),
            title: columns[3].to_string(),
            abstract_text: columns[4].to_string(),
            url: columns[5].to_string(),
            title_entities: columns[6].to_string(),
            abstract_entities: columns[7].to_string(),
        });
    }

    Ok(items)
}

/// Load `news.tsv` into a catalog sorted by news id.
pub fn load_news_tsv(path: &Path) -> Result<Catalog> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open news file {}", path.display()))?;
    let items = parse_news(BufReader::new(file))?;
    let catalog = Catalog::new(items)?;

    info!(target: TARGET_NEWS, "Loaded {} news items from {}", catalog.len(), path.display());
    Ok(catalog)
}

/// Parse behavior rows, concatenating every impression's click history per user in file order.
pub fn parse_behaviors<R: BufRead>(reader: R) -> Result<ClickHistories> {
    let mut histories = ClickHistories::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line =
            line.with_context(|| format!("Failed to read behaviors line {}", line_number + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        let columns: Vec<&str> = line.split('\t').collect();
        let user_id = match columns.get(1).map(|s| s.trim()) {
            Some(user_id) if !user_id.is_empty() => user_id,
            _ => {
                warn!(target: TARGET_NEWS, "Skipping behaviors line {} without user id", line_number + 1);
                continue;
            }
        };

        let clicks = histories.entry(user_id.to_string()).or_default();
        if let Some(history) = columns.get(BEHAVIOR_HISTORY_COLUMN) {
            clicks.extend(history.split_whitespace().map(str::to_string));
        }
    }

    Ok(histories)
}

/// Load `behaviors.tsv` into per-user click histories.
pub fn load_click_histories(path: &Path) -> Result<ClickHistories> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open behaviors file {}", path.display()))?;
    let histories = parse_behaviors(BufReader::new(file))?;

    info!(target: TARGET_NEWS, "Loaded click histories for {} users from {}", histories.len(), path.display());
    Ok(histories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_parse_news_pads_missing_columns() {
        let data = "N2\tsports\tgolf\tTitle two\tAbstract two\thttps://x\t[]\t[]\n\
                    \n\
                    N1\tnews\tnewsus\tTitle one\n";
        let items = parse_news(Cursor::new(data)).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "N2");
        assert_eq!(items[0].url, "https://x");
        assert_eq!(items[1].title, "Title one");
        assert_eq!(items[1].abstract_text, "");
    }

    #[test]
    fn test_parse_behaviors_concatenates_per_user() {
        let data = "1\tU1\t11/11/2019 9:05:58 AM\tN1 N2\tN5-1 N6-0\n\
                    2\tU2\t11/11/2019 9:06:00 AM\t\tN7-0\n\
                    3\tU1\t11/12/2019 9:05:58 AM\tN3\tN8-1\n";
        let histories = parse_behaviors(Cursor::new(data)).unwrap();

        assert_eq!(histories["U1"], vec!["N1", "N2", "N3"]);
        assert!(histories["U2"].is_empty());
        let users: Vec<&String> = histories.keys().collect();
        assert_eq!(users, vec!["U1", "U2"]);
    }

    #[test]
    fn test_load_news_tsv_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "N9\tnews\tnewsworld\tNine\tAbstract").unwrap();
        writeln!(file, "N4\tnews\tnewsus\tFour\tAbstract").unwrap();

        let catalog = load_news_tsv(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.position("N4"), Some(0));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_click_histories(Path::new("/nonexistent/behaviors.tsv"));
        assert!(result.is_err());
    }
}
