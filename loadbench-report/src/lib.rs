#![warn(missing_docs)]
//! loadbench Report - Comparison Assembly
//!
//! Composes grouped statistics, scaling analysis and sanity results into
//! immutable report values:
//! - `ComparisonReport` over runs grouped by configuration
//! - `SimplifiedReport` treating every run as its own point
//! - `Findings` with best/worst configurations, stability and a recommendation
//!
//! Rendering to text or markdown is left to consumers of these values.

mod compare;
mod findings;
mod json;
mod report;

pub use compare::{
    MIN_COMPARISON_RUNS, build_simplified_report, compare_runs, compare_runs_with_baseline,
};
pub use findings::{derive_findings, recommend, recommendation_score};
pub use json::generate_json_report;
pub use report::{
    ComparisonReport, Findings, REPORT_SCHEMA_VERSION, Recommendation, RecommendationBasis,
    ReportMeta, SimplifiedPoint, SimplifiedReport, StabilityAssessment,
};
