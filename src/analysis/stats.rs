//! Descriptive statistics shared by the analysis channels.
//!
//! Every function returns 0.0 for an empty sample, never NaN: downstream
//! report fields are plain numbers with no "missing" representation.

/// Calculate mean of a slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate median of a slice: average of the two middle elements for an
/// even-length sample, the single middle element for odd length.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Calculate the p-th percentile using the nearest-rank method:
/// sort ascending, index = ceil(p/100 × n) − 1, clamped to [0, n−1].
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    let rank = (p / 100.0 * n as f64).ceil() as isize - 1;
    let idx = rank.clamp(0, n as isize - 1) as usize;
    sorted[idx]
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Minimum of a slice, 0.0 when empty.
pub fn min(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

/// Maximum of a slice, 0.0 when empty.
pub fn max(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_rank_percentile() {
        let values = [10.0, 20.0, 30.0, 40.0];
        // ceil(0.95 * 4) - 1 = 3
        assert_eq!(percentile(&values, 95.0), 40.0);
        // ceil(0.50 * 4) - 1 = 1
        assert_eq!(percentile(&values, 50.0), 20.0);
        assert_eq!(percentile(&values, 99.0), 40.0);
        assert_eq!(percentile(&values, 0.0), 10.0);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[10.0, 20.0, 30.0, 40.0]), 25.0);
        assert_eq!(median(&[10.0, 20.0, 30.0]), 20.0);
        assert_eq!(median(&[42.0]), 42.0);
    }

    #[test]
    fn test_statistics_are_ordered() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0];
        let p25 = percentile(&values, 25.0);
        let med = median(&values);
        let p95 = percentile(&values, 95.0);
        let p99 = percentile(&values, 99.0);
        assert!(min(&values) <= p25);
        assert!(p25 <= med);
        assert!(med <= p95);
        assert!(p95 <= p99);
        assert!(p99 <= max(&values));
    }

    #[test]
    fn test_empty_sample_yields_zero() {
        let empty: [f64; 0] = [];
        assert_eq!(mean(&empty), 0.0);
        assert_eq!(median(&empty), 0.0);
        assert_eq!(percentile(&empty, 95.0), 0.0);
        assert_eq!(std_dev(&empty), 0.0);
        assert_eq!(min(&empty), 0.0);
        assert_eq!(max(&empty), 0.0);
    }

    #[test]
    fn test_population_std_dev() {
        // Known population: mean 5, squared deviations 8+2+2+8 over 4 = 5.
        let values = [2.0, 4.0, 6.0, 8.0];
        assert!((std_dev(&values) - 5.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(std_dev(&[7.0]), 0.0);
    }
}
