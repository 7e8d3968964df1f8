//! Report Data Structures
//!
//! Plain serializable values. A report is built once and never mutated.

use chrono::{DateTime, Utc};
use loadbench_analysis::{ConfigGroup, KneePoint, SanityCheckResults, ScalingAnalysis};
use loadbench_core::ConfigSpec;
use serde::{Deserialize, Serialize};

/// Bumped whenever the serialized shape changes
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Report metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    /// `REPORT_SCHEMA_VERSION` at generation time
    pub schema_version: u32,
    /// Version of the crate that produced the report
    pub version: String,
    /// Generation timestamp
    pub generated_at: DateTime<Utc>,
}

impl ReportMeta {
    /// Metadata stamped now
    pub fn now() -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now(),
        }
    }
}

/// Throughput stability of one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityAssessment {
    /// Group assessed
    pub spec: ConfigSpec,
    /// Coefficient of variation of TPS, in percent
    pub cv_pct: f64,
    /// CV within the threshold
    pub stable: bool,
}

/// How the recommended configuration was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationBasis {
    /// The group right before a detected knee
    BeforeKnee,
    /// Highest `speedup / (1 + p95 / 10)`
    BestScore,
}

/// Suggested configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Recommended configuration
    pub spec: ConfigSpec,
    /// Recommended concurrency level
    pub threads: u32,
    /// Rule that chose it
    pub basis: RecommendationBasis,
    /// Throughput-vs-latency score of the chosen group
    pub score: f64,
    /// Human-readable summary
    pub text: String,
}

/// Conclusions drawn from groups and scaling analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Findings {
    /// Highest mean TPS
    pub best_tps: Option<ConfigSpec>,
    /// Lowest reported mean p95
    pub best_latency: Option<ConfigSpec>,
    /// Highest mean p95
    pub worst_latency: Option<ConfigSpec>,
    /// Diminishing-returns point
    pub knee: KneePoint,
    /// One entry per group
    pub stability: Vec<StabilityAssessment>,
    /// No group exceeded the CV threshold
    pub all_stable: bool,
    /// Suggested configuration
    pub recommendation: Recommendation,
}

/// Full comparison across repeated runs of several configurations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Report metadata
    pub meta: ReportMeta,
    /// Groups, ascending thread count
    pub groups: Vec<ConfigGroup>,
    /// Speedup, efficiency and knee
    pub scaling: ScalingAnalysis,
    /// Invariant checks per group
    pub sanity: SanityCheckResults,
    /// Conclusions
    pub findings: Findings,
}

/// One run as a single data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedPoint {
    /// Source run
    pub run_id: String,
    /// Run configuration
    pub spec: ConfigSpec,
    /// Transactions per second
    pub tps: f64,
    /// Queries per second, measured or estimated
    pub qps: f64,
    /// QPS was estimated from TPS
    pub qps_estimated: bool,
    /// 95th percentile latency (ms)
    pub p95_ms: f64,
}

/// Comparison that treats every run as its own point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedReport {
    /// Report metadata
    pub meta: ReportMeta,
    /// Ascending thread count
    pub points: Vec<SimplifiedPoint>,
    /// Scaling over the points
    pub scaling: ScalingAnalysis,
    /// Conclusions
    pub findings: Findings,
}
