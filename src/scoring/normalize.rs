use crate::vector::ScoreVector;

/// Ranges narrower than this count as constant.
pub const NORMALIZE_EPSILON: f64 = 1e-8;

/// Decimal places kept for normalized, hybrid and metric values.
pub const SCORE_PRECISION: u32 = 4;

/// Round half away from zero to `places` decimals.
///
/// Precision beyond what an `f64` can scale returns `value` unchanged.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(i32::try_from(places).unwrap_or(i32::MAX));
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Min-max rescale scores into `[0, 1]`, rounded to [`SCORE_PRECISION`] places.
///
/// A (near-)constant vector carries no ranking signal and maps to all zeros.
/// Empty input yields an empty vector.
pub fn normalize(scores: &ScoreVector) -> Vec<f64> {
    let values = scores.to_dense();
    if values.is_empty() {
        return values;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range < NORMALIZE_EPSILON {
        return vec![0.0; values.len()];
    }

    values
        .iter()
        .map(|v| round_to((v - min) / (range + NORMALIZE_EPSILON), SCORE_PRECISION))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123_456, 4), 0.1235);
        assert_eq!(round_to(0.999_96, 4), 1.0);
        assert_eq!(round_to(2.0 / 3.0, 4), 0.6667);
    }

    #[test]
    fn test_round_to_large_places_is_identity() {
        assert_eq!(round_to(0.123_456, 400), 0.123_456);
        assert_eq!(round_to(0.123_456, u32::MAX), 0.123_456);
        assert_eq!(round_to(0.0, u32::MAX), 0.0);
        assert_eq!(round_to(1e300, 20), 1e300);
    }

    #[test]
    fn test_normalize_bounds() {
        let normalized = normalize(&ScoreVector::Dense(vec![-0.2, 0.3, 0.8, 0.05]));
        assert_eq!(normalized.len(), 4);
        assert!(normalized.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(normalized[0], 0.0);
        assert_eq!(normalized[2], 1.0);
        assert_eq!(normalized[1], 0.5);
    }

    #[test]
    fn test_normalize_constant_vector_is_all_zero() {
        assert_eq!(normalize(&ScoreVector::Dense(vec![0.7; 5])), vec![0.0; 5]);
        assert_eq!(normalize(&ScoreVector::zeros(3)), vec![0.0; 3]);
        assert_eq!(
            normalize(&ScoreVector::Dense(vec![1.0, 1.0 + 1e-9])),
            vec![0.0, 0.0]
        );
    }

    #[test]
    fn test_normalize_sparse_matches_dense() {
        let sparse = ScoreVector::Sparse {
            len: 4,
            entries: vec![(1, 4.0), (3, 2.0)],
        };
        let dense = ScoreVector::Dense(vec![0.0, 4.0, 0.0, 2.0]);
        assert_eq!(normalize(&sparse), normalize(&dense));
        assert_eq!(normalize(&sparse), vec![0.0, 1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_normalize_single_value_and_empty() {
        assert_eq!(normalize(&ScoreVector::Dense(vec![3.0])), vec![0.0]);
        assert!(normalize(&ScoreVector::Dense(vec![])).is_empty());
    }
}
