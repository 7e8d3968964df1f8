//! Run Aggregation
//!
//! `aggregate_runs` turns the runs of one configuration into `RunStats`.
//! Pure and allocation-light; safe to call concurrently on disjoint inputs.

use crate::summary::{RunMetricStats, compute_metric_stats};
use loadbench_core::Run;
use serde::{Deserialize, Serialize};

/// Aggregated statistics for the runs of one configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Number of runs aggregated
    pub run_count: usize,

    /// Transactions per second
    pub tps: RunMetricStats,
    /// Queries per second
    pub qps: RunMetricStats,
    /// Mean latency (ms)
    pub latency_avg: RunMetricStats,
    /// 95th percentile latency (ms)
    pub latency_p95: RunMetricStats,
    /// 99th percentile latency (ms)
    pub latency_p99: RunMetricStats,
    /// Minimum latency (ms)
    pub latency_min: RunMetricStats,
    /// Maximum latency (ms)
    pub latency_max: RunMetricStats,

    /// Errors summed over all runs
    pub total_errors: u64,
    /// Reconnects summed over all runs
    pub total_reconnects: u64,
    /// Either sum is non-zero
    pub has_errors: bool,

    /// Share of read queries in percent, over summed counts
    pub read_pct: f64,
    /// Share of write queries in percent, over summed counts
    pub write_pct: f64,
    /// Share of other queries in percent, over summed counts
    pub other_pct: f64,
    /// Mean queries per transaction over runs that recorded transactions
    pub avg_queries_per_tx: f64,
}

fn metric(runs: &[Run], f: impl Fn(&Run) -> f64) -> RunMetricStats {
    let values: Vec<f64> = runs.iter().map(f).collect();
    compute_metric_stats(&values)
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Aggregate `runs`. Empty input yields all zeros.
pub fn aggregate_runs(runs: &[Run]) -> RunStats {
    if runs.is_empty() {
        return RunStats::default();
    }

    let total_errors: u64 = runs.iter().map(|r| r.errors).sum();
    let total_reconnects: u64 = runs.iter().map(|r| r.reconnects).sum();

    let read: u64 = runs.iter().map(|r| r.read_queries).sum();
    let write: u64 = runs.iter().map(|r| r.write_queries).sum();
    let other: u64 = runs.iter().map(|r| r.other_queries).sum();
    let total: u64 = runs.iter().map(|r| r.total_queries).sum();

    let per_tx: Vec<f64> = runs
        .iter()
        .filter(|r| r.transactions > 0)
        .map(Run::queries_per_transaction)
        .collect();
    let avg_queries_per_tx = if per_tx.is_empty() {
        0.0
    } else {
        per_tx.iter().sum::<f64>() / per_tx.len() as f64
    };

    RunStats {
        run_count: runs.len(),
        tps: metric(runs, |r| r.tps),
        qps: metric(runs, |r| r.qps),
        latency_avg: metric(runs, |r| r.latency_avg_ms),
        latency_p95: metric(runs, |r| r.latency_p95_ms),
        latency_p99: metric(runs, |r| r.latency_p99_ms),
        latency_min: metric(runs, |r| r.latency_min_ms),
        latency_max: metric(runs, |r| r.latency_max_ms),
        total_errors,
        total_reconnects,
        has_errors: total_errors > 0 || total_reconnects > 0,
        read_pct: percent(read, total),
        write_pct: percent(write, total),
        other_pct: percent(other, total),
        avg_queries_per_tx,
    }
}
