//! Analysis Policy
//!
//! Heuristic thresholds used by the scaling, sanity and report stages.
//! The knee thresholds are fixed: `ScalingPolicy::default()` is what every
//! report uses. Sanity tolerances, the stability threshold and the assumed
//! queries per transaction can be overridden from configuration.

use serde::{Deserialize, Serialize};

/// Knee triggers when efficiency drops below this
pub const DEFAULT_KNEE_MIN_EFFICIENCY: f64 = 0.70;

/// Knee triggers when TPS gain over the previous group is below this (percent)
pub const DEFAULT_KNEE_MIN_TPS_GAIN_PCT: f64 = 10.0;

/// Allowed relative deviation between actual and expected QPS (percent)
pub const DEFAULT_QPS_TOLERANCE_PCT: f64 = 5.0;

/// Slack allowed in the latency ordering chain (milliseconds)
pub const DEFAULT_LATENCY_TOLERANCE_MS: f64 = 0.01;

/// Queries per transaction assumed when runs carry no query counts
pub const DEFAULT_ASSUMED_QUERIES_PER_TX: f64 = 20.0;

/// Knee detection thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    /// Efficiency below which a group is the knee
    pub knee_min_efficiency: f64,
    /// TPS gain over the previous group (percent) below which a group is the knee
    pub knee_min_tps_gain_pct: f64,
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            knee_min_efficiency: DEFAULT_KNEE_MIN_EFFICIENCY,
            knee_min_tps_gain_pct: DEFAULT_KNEE_MIN_TPS_GAIN_PCT,
        }
    }
}

/// Sanity check tolerances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SanityPolicy {
    /// Allowed QPS deviation from TPS × queries/tx (percent)
    pub qps_tolerance_pct: f64,
    /// Slack in the latency ordering chain (ms)
    pub latency_tolerance_ms: f64,
}

impl Default for SanityPolicy {
    fn default() -> Self {
        Self {
            qps_tolerance_pct: DEFAULT_QPS_TOLERANCE_PCT,
            latency_tolerance_ms: DEFAULT_LATENCY_TOLERANCE_MS,
        }
    }
}

/// Everything the comparison pipeline is parameterized by
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPolicy {
    /// Knee thresholds
    pub scaling: ScalingPolicy,
    /// Sanity check tolerances
    pub sanity: SanityPolicy,
    /// CV (percent) above which a group is flagged unstable
    pub cv_threshold_pct: f64,
    /// Used by the simplified report to estimate QPS
    pub assumed_queries_per_tx: f64,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            scaling: ScalingPolicy::default(),
            sanity: SanityPolicy::default(),
            cv_threshold_pct: loadbench_stats::DEFAULT_CV_THRESHOLD_PCT,
            assumed_queries_per_tx: DEFAULT_ASSUMED_QUERIES_PER_TX,
        }
    }
}
