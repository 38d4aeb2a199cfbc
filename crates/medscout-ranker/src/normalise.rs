//! Score normalisation functions.

/// Min-max normalise one metric column across all candidates.
/// `(v - min) / (max - min)` when the column has spread; a zero-range
/// column normalises to 0.0 for every row, so a metric on which all
/// candidates agree contributes nothing to the ranking and never
/// divides by zero.
pub fn minmax_column(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return vec![];
    }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if (hi - lo).abs() < 1e-12 {
        return vec![0.0; values.len()];
    }

    values
        .iter()
        .map(|v| ((v - lo) / (hi - lo)).clamp(0.0, 1.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minmax_endpoints() {
        let normed = minmax_column(&[10.0, 20.0, 30.0]);
        assert!((normed[0] - 0.0).abs() < 1e-12); // min → 0
        assert!((normed[1] - 0.5).abs() < 1e-12);
        assert!((normed[2] - 1.0).abs() < 1e-12); // max → 1
    }

    #[test]
    fn test_zero_range_column_is_all_zero() {
        let normed = minmax_column(&[7.0, 7.0, 7.0]);
        assert_eq!(normed, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_column() {
        assert!(minmax_column(&[]).is_empty());
    }

    #[test]
    fn test_single_row_column_is_zero() {
        // One row means no spread, same degenerate case as all-equal
        assert_eq!(minmax_column(&[42.0]), vec![0.0]);
    }

    #[test]
    fn test_values_stay_in_unit_interval() {
        let normed = minmax_column(&[-5.0, 0.0, 5.0, 100.0]);
        for n in normed {
            assert!((0.0..=1.0).contains(&n));
        }
    }
}
