//! Item-to-item collaborative filtering affinities derived from co-clicks.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::info;

use crate::news::{Catalog, ClickHistories};
use crate::vector::ScoreVector;
use crate::ItemId;

pub const TARGET_COLLAB: &str = "collab";

/// Source of collaborative-filter affinities for a target item.
pub trait CollaborativeSource: Send + Sync {
    /// Scores aligned with `catalog`, or `None` when the target has no collaborative data.
    fn cf_scores(&self, target: &str, catalog: &Catalog) -> Result<Option<ScoreVector>>;
}

/// Sparse item-by-item similarity table.
///
/// Rows are keyed by the target item; each row maps other items to their
/// affinity with the target. Missing entries are zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemSimilarityTable {
    rows: HashMap<ItemId, HashMap<ItemId, f64>>,
}

impl ItemSimilarityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a symmetric affinity between two items.
    pub fn insert(&mut self, a: &str, b: &str, affinity: f64) {
        self.rows
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string(), affinity);
        self.rows
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string(), affinity);
    }

    pub fn affinity(&self, a: &str, b: &str) -> f64 {
        self.rows
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn item_count(&self) -> usize {
        self.rows.len()
    }

    /// Affinities of every catalog item with `target`, in catalog order.
    ///
    /// Returns `None` when the table holds no row for `target`.
    pub fn scores_for(&self, target: &str, catalog: &Catalog) -> Option<ScoreVector> {
        let row = self.rows.get(target)?;
        let mut entries: Vec<(usize, f64)> = row
            .iter()
            .filter_map(|(id, &affinity)| catalog.position(id).map(|position| (position, affinity)))
            .collect();
        entries.sort_by_key(|(position, _)| *position);

        Some(ScoreVector::Sparse {
            len: catalog.len(),
            entries,
        })
    }

    /// Build item-item cosine similarity over the binary user-by-item click matrix.
    ///
    /// Each user contributes once per distinct clicked item; self-pairs are skipped.
    pub fn from_click_histories(histories: &ClickHistories) -> Self {
        let mut item_users: HashMap<&str, usize> = HashMap::new();
        let mut co_clicks: BTreeMap<(&str, &str), usize> = BTreeMap::new();

        for clicks in histories.values() {
            let mut distinct: Vec<&str> = clicks
                .iter()
                .map(String::as_str)
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            distinct.sort_unstable();

            for (i, &a) in distinct.iter().enumerate() {
                *item_users.entry(a).or_default() += 1;
                for &b in &distinct[i + 1..] {
                    *co_clicks.entry((a, b)).or_default() += 1;
                }
            }
        }

        let mut table = ItemSimilarityTable::new();
        for ((a, b), both) in co_clicks {
            let denominator = ((item_users[a] * item_users[b]) as f64).sqrt();
            table.insert(a, b, both as f64 / denominator);
        }

        info!(target: TARGET_COLLAB,
            "Built item similarity table with {} items from {} users",
            table.item_count(),
            histories.len()
        );
        table
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read item similarity table {}", path.display())
        })?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse item similarity table {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string(self)?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write item similarity table {}", path.display()))
    }
}

impl CollaborativeSource for ItemSimilarityTable {
    fn cf_scores(&self, target: &str, catalog: &Catalog) -> Result<Option<ScoreVector>> {
        Ok(self.scores_for(target, catalog))
    }
}
