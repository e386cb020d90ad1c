use anyhow::Result;

use super::types::{ScoreVector, SimilarityMode, SparseVector};

/// Vectors with a magnitude below this are treated as empty.
const MIN_MAGNITUDE: f32 = 1e-6;

/// A content-based similarity pipeline.
///
/// Implementations score a target's text against every catalog item and
/// return a vector aligned with catalog order.
pub trait ContentSource: Send + Sync {
    fn mode(&self) -> SimilarityMode;

    fn content_scores(&self, content: &str) -> Result<ScoreVector>;
}

/// Calculate cosine similarity directly between two dense vectors
///
/// # Arguments
/// * `vec1` - First vector
/// * `vec2` - Second vector
///
/// # Returns
/// * `Result<f32>` - The cosine similarity, 0.0 if either vector has no magnitude
pub fn cosine_similarity(vec1: &[f32], vec2: &[f32]) -> Result<f32> {
    if vec1.len() != vec2.len() {
        return Err(anyhow::anyhow!(
            "Vector dimensions don't match: {} vs {}",
            vec1.len(),
            vec2.len()
        ));
    }

    let mag1: f32 = vec1.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag2: f32 = vec2.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag1 < MIN_MAGNITUDE || mag2 < MIN_MAGNITUDE {
        return Ok(0.0);
    }

    let dot_product: f32 = vec1.iter().zip(vec2.iter()).map(|(a, b)| a * b).sum();
    Ok(dot_product / (mag1 * mag2))
}

/// Cosine similarity between two sparse vectors, 0.0 if either is empty.
pub fn sparse_cosine_similarity(vec1: &SparseVector, vec2: &SparseVector) -> f32 {
    let mag1 = vec1.norm();
    let mag2 = vec2.norm();
    if mag1 < MIN_MAGNITUDE || mag2 < MIN_MAGNITUDE {
        return 0.0;
    }
    vec1.dot(vec2) / (mag1 * mag2)
}
