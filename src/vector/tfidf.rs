use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::info;
use unicode_segmentation::UnicodeSegmentation;

use super::similarity::{sparse_cosine_similarity, ContentSource};
use super::types::{ScoreVector, SimilarityMode, SparseVector};
use super::TARGET_VECTOR;
use crate::news::{clean_text, Catalog};

/// Term-frequency / inverse-document-frequency vectorizer.
///
/// Uses raw term counts, smoothed idf `ln((1 + n) / (1 + df)) + 1` and L2
/// row normalization. Tokens shorter than two characters are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.unicode_words()
        .filter(|word| word.chars().count() >= 2)
        .map(|word| word.to_lowercase())
}

impl TfidfVectorizer {
    /// Learn vocabulary and idf weights from already-cleaned documents.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for document in documents {
            let mut terms: Vec<String> = tokenize(document.as_ref()).collect();
            terms.sort();
            terms.dedup();
            for term in terms {
                *document_frequency.entry(term).or_default() += 1;
            }
        }

        let n = documents.len() as f32;
        let mut vocabulary = HashMap::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());
        // BTreeMap iteration gives a sorted, reproducible vocabulary
        for (index, (term, df)) in document_frequency.into_iter().enumerate() {
            vocabulary.insert(term, index);
            idf.push(((1.0 + n) / (1.0 + df as f32)).ln() + 1.0);
        }

        info!(target: TARGET_VECTOR, "Fitted TF-IDF vocabulary of {} terms on {} documents", idf.len(), documents.len());
        TfidfVectorizer { vocabulary, idf }
    }

    /// Vectorize a cleaned document. Out-of-vocabulary terms are ignored.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for term in tokenize(document) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_default() += 1.0;
            }
        }

        let weighted: Vec<(usize, f32)> = counts
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index]))
            .collect();
        let mut vector = SparseVector::from_pairs(weighted);

        let norm = vector.norm();
        if norm > 0.0 {
            vector.values.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read TF-IDF vectorizer {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse TF-IDF vectorizer {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string(self)?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write TF-IDF vectorizer {}", path.display()))
    }
}

/// Sparse TF-IDF content source over the whole catalog.
pub struct TfidfSource {
    vectorizer: TfidfVectorizer,
    rows: Vec<SparseVector>,
}

impl TfidfSource {
    /// Vectorize every catalog item's cleaned content with a fitted vectorizer.
    pub fn build(catalog: &Catalog, vectorizer: TfidfVectorizer) -> Self {
        let rows = catalog
            .items()
            .iter()
            .map(|item| vectorizer.transform(&clean_text(&item.content())))
            .collect();
        TfidfSource { vectorizer, rows }
    }

    /// Fit a vectorizer on the catalog itself, then build the source.
    pub fn fit(catalog: &Catalog) -> Self {
        let documents: Vec<String> = catalog
            .items()
            .iter()
            .map(|item| clean_text(&item.content()))
            .collect();
        let vectorizer = TfidfVectorizer::fit(&documents);
        let rows = documents.iter().map(|d| vectorizer.transform(d)).collect();
        TfidfSource { vectorizer, rows }
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }
}

impl ContentSource for TfidfSource {
    fn mode(&self) -> SimilarityMode {
        SimilarityMode::Tfidf
    }

    fn content_scores(&self, content: &str) -> Result<ScoreVector> {
        let target = self.vectorizer.transform(&clean_text(content));
        let entries = self
            .rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| {
                let score = sparse_cosine_similarity(&target, row);
                (score != 0.0).then_some((index, f64::from(score)))
            })
            .collect();

        Ok(ScoreVector::Sparse {
            len: self.rows.len(),
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::NewsItem;

    #[test]
    fn test_idf_weights_rare_terms_higher() {
        let vectorizer = TfidfVectorizer::fit(&["apple banana", "apple cherry", "apple"][..]);
        assert_eq!(vectorizer.vocabulary_size(), 3);

        let apple = vectorizer.vocabulary["apple"];
        let cherry = vectorizer.vocabulary["cherry"];
        assert!((vectorizer.idf[apple] - 1.0).abs() < 1e-6);
        assert!(vectorizer.idf[cherry] > vectorizer.idf[apple]);
    }

    #[test]
    fn test_transform_is_unit_length_and_ignores_unknown_terms() {
        let vectorizer = TfidfVectorizer::fit(&["apple banana", "cherry"][..]);
        let vector = vectorizer.transform("banana banana apple durian x");
        assert_eq!(vector.nnz(), 2);
        assert!((vector.norm() - 1.0).abs() < 1e-6);
        assert_eq!(vectorizer.transform("durian").nnz(), 0);
    }

    #[test]
    fn test_tfidf_source_matches_itself_best() {
        let catalog = Catalog::new(vec![
            NewsItem::new("N1", "sports", "golf", "Golfer wins masters", "golf tournament"),
            NewsItem::new("N2", "finance", "markets", "Stocks fall", "market selloff deepens"),
            NewsItem::new("N3", "sports", "tennis", "Tennis final", "tournament final"),
        ])
        .unwrap();
        let source = TfidfSource::fit(&catalog);
        let target = catalog.get("N1").unwrap().content();

        let scores = source.content_scores(&target).unwrap();
        assert_eq!(scores.len(), 3);
        let dense = scores.to_dense();
        assert!((dense[0] - 1.0).abs() < 1e-5);
        assert!(dense[0] > dense[2]);
        assert!(dense[2] > dense[1]);
    }
}
