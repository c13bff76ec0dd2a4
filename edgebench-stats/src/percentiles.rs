//! Percentile Computation
//!
//! Computes percentiles from raw run measurements. With the small repeat
//! counts typical of engine benchmarking (5 measured runs), estimates are
//! coarse; the contract is monotonicity and exact min/max fidelity, not
//! statistical optimality.

/// Compute a single percentile from samples
///
/// Uses linear interpolation between nearest ranks, applied uniformly to
/// every metric so summaries stay comparable across experiments.
pub fn compute_percentile(samples: &[f64], percentile: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    if samples.len() == 1 {
        return samples[0];
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let p = percentile / 100.0;

    // Linear interpolation between nearest ranks
    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = (lower_idx + 1).min(n - 1);
    let fraction = rank - lower_idx as f64;

    sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let p50 = compute_percentile(&samples, 50.0);
        assert!((p50 - 3.0).abs() < 0.01);
    }

    #[test]
    fn test_unsorted_input() {
        let samples = vec![5.0, 1.0, 4.0, 2.0, 3.0];
        let p50 = compute_percentile(&samples, 50.0);
        assert!((p50 - 3.0).abs() < 0.01);
    }

    #[test]
    fn test_tail_percentiles() {
        let samples: Vec<f64> = (1..=1000).map(|x| x as f64).collect();
        let p95 = compute_percentile(&samples, 95.0);
        let p99 = compute_percentile(&samples, 99.0);

        assert!(p95 > 945.0 && p95 < 955.0);
        assert!(p99 > 985.0 && p99 <= 1000.0);
    }

    #[test]
    fn test_single_sample() {
        let samples = vec![42.0];
        let p50 = compute_percentile(&samples, 50.0);
        assert!((p50 - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_samples() {
        let samples: Vec<f64> = Vec::new();
        let p50 = compute_percentile(&samples, 50.0);
        assert!((p50 - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentiles_monotonic_small_series() {
        // Five measured runs is the common case
        let samples = vec![0.85, 0.82, 0.83, 0.90, 0.81];
        let p50 = compute_percentile(&samples, 50.0);
        let p95 = compute_percentile(&samples, 95.0);
        let p99 = compute_percentile(&samples, 99.0);

        assert!(p50 <= p95);
        assert!(p95 <= p99);
        assert!(p99 <= 0.90);
    }
}
