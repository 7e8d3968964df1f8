#![warn(missing_docs)]
//! loadbench Statistics Engine
//!
//! Aggregates repeated runs of one configuration:
//! - Per-metric N, mean, sample standard deviation, min, max, median
//! - Error and reconnect totals
//! - Query mix (read/write/other shares) and queries per transaction

mod aggregate;
mod percentiles;
mod summary;

pub use aggregate::{RunStats, aggregate_runs};
pub use percentiles::{compute_percentile, median};
pub use summary::{RunMetricStats, compute_metric_stats};

/// Coefficient of variation (percent) above which a metric is unstable
pub const DEFAULT_CV_THRESHOLD_PCT: f64 = 10.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!((DEFAULT_CV_THRESHOLD_PCT - 10.0).abs() < f64::EPSILON);
    }
}
