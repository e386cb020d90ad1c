use anyhow::{bail, Result};
use std::collections::HashMap;

use super::types::NewsItem;

/// Ordered, index-stable collection of news items.
///
/// Items are sorted by identifier on construction; every score vector handed
/// to the scoring core is aligned with this order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<NewsItem>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(mut items: Vec<NewsItem>) -> Result<Self> {
        items.sort_by(|a, b| a.id.cmp(&b.id));

        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if index.insert(item.id.clone(), position).is_some() {
                bail!("Duplicate news id in catalog: {}", item.id);
            }
        }

        Ok(Catalog { items, index })
    }

    pub fn get(&self, id: &str) -> Option<&NewsItem> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn item_at(&self, position: usize) -> Option<&NewsItem> {
        self.items.get(position)
    }

    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
