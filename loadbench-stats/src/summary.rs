//! Per-metric Summary Statistics
//!
//! Mean and variance use Welford's single-pass update; the standard
//! deviation is the sample deviation (N-1) and is exactly zero for N=1.

use crate::percentiles::median;
use serde::{Deserialize, Serialize};

/// Summary of one metric across the runs of a group
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunMetricStats {
    /// Number of values
    pub n: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation
    pub stddev: f64,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Middle value
    pub median: f64,
}

impl RunMetricStats {
    /// Coefficient of variation in percent (0 when the mean is 0)
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean == 0.0 {
            0.0
        } else {
            (self.stddev / self.mean) * 100.0
        }
    }

    /// Whether the CV is at or below `cv_threshold_pct`
    pub fn is_stable(&self, cv_threshold_pct: f64) -> bool {
        self.coefficient_of_variation() <= cv_threshold_pct
    }
}

/// Compute summary statistics for `values`. Empty input yields all zeros.
pub fn compute_metric_stats(values: &[f64]) -> RunMetricStats {
    if values.is_empty() {
        return RunMetricStats::default();
    }

    let mut mean = 0.0;
    let mut m2 = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for (i, &x) in values.iter().enumerate() {
        let delta = x - mean;
        mean += delta / (i + 1) as f64;
        m2 += delta * (x - mean);
        min = min.min(x);
        max = max.max(x);
    }

    let n = values.len();
    let stddev = if n < 2 {
        0.0
    } else {
        (m2 / (n - 1) as f64).max(0.0).sqrt()
    };

    RunMetricStats {
        n,
        mean,
        stddev,
        min,
        max,
        median: median(values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_summary() {
        let stats = compute_metric_stats(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(stats.n, 5);
        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert!((stats.median - 3.0).abs() < 1e-12);
        // Sample variance of 1..5 is 2.5
        assert!((stats.stddev - 2.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
    }

    #[test]
    fn test_single_value() {
        let stats = compute_metric_stats(&[742.5]);
        assert_eq!(stats.n, 1);
        assert_eq!(stats.stddev, 0.0);
        assert_eq!(stats.min, stats.max);
        assert_eq!(stats.mean, stats.min);
    }

    #[test]
    fn test_identical_values_have_zero_cv() {
        let stats = compute_metric_stats(&[100.0, 100.0, 100.0]);
        assert_eq!(stats.stddev, 0.0);
        assert_eq!(stats.coefficient_of_variation(), 0.0);
        assert!(stats.is_stable(10.0));
    }

    #[test]
    fn test_large_offset_is_numerically_stable() {
        let base = 1e9;
        let stats = compute_metric_stats(&[base + 4.0, base + 7.0, base + 13.0, base + 16.0]);
        // Sample variance of {4, 7, 13, 16} is 30
        assert!((stats.stddev - 30f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_cv_and_zero_mean() {
        let stats = compute_metric_stats(&[90.0, 110.0]);
        assert!((stats.coefficient_of_variation() - 14.142135623730951).abs() < 1e-9);
        assert!(!stats.is_stable(10.0));

        let zeros = compute_metric_stats(&[0.0, 0.0]);
        assert_eq!(zeros.coefficient_of_variation(), 0.0);
    }

    #[test]
    fn test_empty() {
        assert_eq!(compute_metric_stats(&[]), RunMetricStats::default());
    }
}
