#![warn(missing_docs)]
//! loadbench Analysis - Scaling & Sanity Engine
//!
//! Consumes `Run` records produced by the adapters:
//! - groups runs by `ConfigSpec` and aggregates each group
//! - derives speedup, efficiency, deltas and the knee across thread counts
//! - checks cross-field invariants per group
//!
//! Every function here is pure over its inputs.

mod error;
mod group;
mod policy;
mod sanity;
mod scaling;

pub use error::AnalysisError;
pub use group::{ConfigGroup, group_runs};
pub use policy::{
    AnalysisPolicy, DEFAULT_ASSUMED_QUERIES_PER_TX, DEFAULT_KNEE_MIN_EFFICIENCY,
    DEFAULT_KNEE_MIN_TPS_GAIN_PCT, DEFAULT_LATENCY_TOLERANCE_MS, DEFAULT_QPS_TOLERANCE_PCT,
    SanityPolicy, ScalingPolicy,
};
pub use sanity::{
    CHECK_NAMES, GroupSanity, SanityCheck, SanityCheckResults, check_group, run_sanity_checks,
};
pub use scaling::{
    Delta, KneePoint, KneeReason, ScalingAnalysis, ScalingMetrics, analyze_scaling,
    find_best_latency_config, find_best_tps_config, find_worst_latency_config,
};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, Utc};
    use loadbench_core::{ConfigSpec, DatabaseType, FinalResult, Run, ToolKind};

    /// A clean sysbench-like run: 20 queries per transaction, ordered latencies
    pub fn run(threads: u32, tps: f64) -> Run {
        run_with_p95(threads, tps, 30.0)
    }

    pub fn run_with_p95(threads: u32, tps: f64, p95: f64) -> Run {
        let tx = (tps * 60.0) as u64;
        let mut result = FinalResult::empty(ToolKind::Sysbench);
        result.tps = tps;
        result.qps = tps * 20.0;
        result.total_transactions = tx;
        result.read_queries = tx * 14;
        result.write_queries = tx * 4;
        result.other_queries = tx * 2;
        result.total_queries = tx * 20;
        result.latency_min_ms = 1.0;
        result.latency_avg_ms = p95 * 0.6;
        result.latency_p95_ms = p95;
        result.latency_p99_ms = p95 * 1.2;
        result.latency_max_ms = p95 * 2.0;

        let start = Utc::now();
        Run::from_final_result(
            format!("run-{}t", threads),
            ConfigSpec::new(threads, DatabaseType::MySql, "oltp_read_write"),
            start,
            start + Duration::seconds(60),
            &result,
        )
    }
}
