use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-item scores aligned with catalog order.
///
/// Sparse vectors treat every index not listed in `entries` as zero.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreVector {
    Dense(Vec<f64>),
    Sparse {
        len: usize,
        entries: Vec<(usize, f64)>,
    },
}

impl ScoreVector {
    pub fn zeros(len: usize) -> Self {
        ScoreVector::Sparse {
            len,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ScoreVector::Dense(values) => values.len(),
            ScoreVector::Sparse { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position and value of the first NaN or infinite score, if any.
    pub fn first_non_finite(&self) -> Option<(usize, f64)> {
        match self {
            ScoreVector::Dense(values) => values
                .iter()
                .copied()
                .enumerate()
                .find(|(_, v)| !v.is_finite()),
            ScoreVector::Sparse { .. } => self
                .to_dense()
                .into_iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite()),
        }
    }

    /// Materialize as a dense vector. Later sparse entries for the same index win.
    pub fn to_dense(&self) -> Vec<f64> {
        match self {
            ScoreVector::Dense(values) => values.clone(),
            ScoreVector::Sparse { len, entries } => {
                let mut dense = vec![0.0; *len];
                for &(index, value) in entries {
                    if index < *len {
                        dense[index] = value;
                    }
                }
                dense
            }
        }
    }
}

/// Which content similarity pipeline to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMode {
    Bert,
    Tfidf,
}

impl fmt::Display for SimilarityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityMode::Bert => write!(f, "bert"),
            SimilarityMode::Tfidf => write!(f, "tfidf"),
        }
    }
}

impl FromStr for SimilarityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bert" => Ok(SimilarityMode::Bert),
            "tfidf" => Ok(SimilarityMode::Tfidf),
            other => Err(format!(
                "unknown similarity mode '{}', expected 'bert' or 'tfidf'",
                other
            )),
        }
    }
}

/// Sparse feature vector with strictly increasing indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f32>,
}

impl SparseVector {
    /// Build from unordered `(index, value)` pairs; zero values are dropped.
    pub fn from_pairs(mut pairs: Vec<(usize, f32)>) -> Self {
        pairs.sort_by_key(|(index, _)| *index);
        pairs.dedup_by(|next, kept| {
            if next.0 == kept.0 {
                kept.1 += next.1;
                true
            } else {
                false
            }
        });

        let (indices, values) = pairs.into_iter().filter(|(_, v)| *v != 0.0).unzip();
        SparseVector { indices, values }
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Dot product via a merge over both sorted index lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_and_dense_agree() {
        let sparse = ScoreVector::Sparse {
            len: 4,
            entries: vec![(1, 0.5), (3, 2.0)],
        };
        assert_eq!(sparse.to_dense(), vec![0.0, 0.5, 0.0, 2.0]);
        assert_eq!(ScoreVector::zeros(3).to_dense(), vec![0.0; 3]);
    }

    #[test]
    fn test_first_non_finite() {
        assert_eq!(ScoreVector::Dense(vec![0.1, 0.9]).first_non_finite(), None);
        assert_eq!(
            ScoreVector::Dense(vec![0.1, f64::INFINITY]).first_non_finite(),
            Some((1, f64::INFINITY))
        );

        let sparse = ScoreVector::Sparse {
            len: 4,
            entries: vec![(1, 0.5), (2, f64::NEG_INFINITY)],
        };
        assert_eq!(sparse.first_non_finite(), Some((2, f64::NEG_INFINITY)));

        let nan = ScoreVector::Sparse {
            len: 3,
            entries: vec![(0, f64::NAN)],
        };
        assert!(matches!(nan.first_non_finite(), Some((0, v)) if v.is_nan()));

        // Entries past the end are never materialized
        let past_end = ScoreVector::Sparse {
            len: 2,
            entries: vec![(5, f64::NAN)],
        };
        assert_eq!(past_end.first_non_finite(), None);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("BERT".parse::<SimilarityMode>(), Ok(SimilarityMode::Bert));
        assert_eq!(" tfidf ".parse::<SimilarityMode>(), Ok(SimilarityMode::Tfidf));
        assert!("word2vec".parse::<SimilarityMode>().is_err());
        assert_eq!(SimilarityMode::Tfidf.to_string(), "tfidf");
    }

    #[test]
    fn test_sparse_vector_dot() {
        let a = SparseVector::from_pairs(vec![(4, 1.0), (0, 2.0), (4, 1.0), (7, 0.0)]);
        assert_eq!(a.indices, vec![0, 4]);
        assert_eq!(a.values, vec![2.0, 2.0]);

        let b = SparseVector::from_pairs(vec![(4, 3.0), (5, 1.0)]);
        assert_eq!(a.dot(&b), 6.0);
        assert_eq!(b.nnz(), 2);
    }
}
