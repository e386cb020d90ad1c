use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{ItemId, UserId};

/// A single news article from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(rename = "News ID")]
    pub id: ItemId,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Subcategory")]
    pub subcategory: String,
    #[serde(rename = "News Title")]
    pub title: String,
    #[serde(rename = "News Abstract")]
    pub abstract_text: String,

    // Display-only columns carried through from news.tsv
    #[serde(rename = "News Url", default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(
        rename = "Entities in News Title",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub title_entities: String,
    #[serde(
        rename = "Entities in News Abstract",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub abstract_entities: String,
}

impl NewsItem {
    pub fn new(id: &str, category: &str, subcategory: &str, title: &str, abstract_text: &str) -> Self {
        NewsItem {
            id: id.to_string(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            title: title.to_string(),
            abstract_text: abstract_text.to_string(),
            url: String::new(),
            title_entities: String::new(),
            abstract_entities: String::new(),
        }
    }

    /// Text fed to the similarity sources: category, subcategory, title and abstract.
    pub fn content(&self) -> String {
        format!(
            "{} {} {} {}",
            self.category, self.subcategory, self.title, self.abstract_text
        )
    }
}

/// Per-user click sequences, oldest click first. Users iterate in sorted order.
pub type ClickHistories = BTreeMap<UserId, Vec<ItemId>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_concatenation() {
        let item = NewsItem::new("N1", "sports", "football_nfl", "Big win", "The team won.");
        assert_eq!(item.content(), "sports football_nfl Big win The team won.");
    }

    #[test]
    fn test_serializes_with_original_column_names() {
        let item = NewsItem::new("N1", "news", "newsus", "Title", "Abstract");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["News ID"], "N1");
        assert_eq!(json["News Title"], "Title");
        assert!(json.get("News Url").is_none());
    }
}
