//! Findings
//!
//! Best and worst configurations, throughput stability, and the
//! recommendation derived from the knee.

use crate::report::{Findings, Recommendation, RecommendationBasis, StabilityAssessment};
use loadbench_analysis::{
    ConfigGroup, ScalingAnalysis, ScalingMetrics, find_best_latency_config, find_best_tps_config,
    find_worst_latency_config,
};

/// Latency penalty scale of the recommendation score, in ms
const SCORE_LATENCY_SCALE_MS: f64 = 10.0;

/// `speedup / (1 + p95 / 10)`: throughput discounted by tail latency
pub fn recommendation_score(metrics: &ScalingMetrics) -> f64 {
    metrics.speedup / (1.0 + metrics.p95_ms / SCORE_LATENCY_SCALE_MS)
}

/// Derive findings for `groups` given their scaling analysis
pub fn derive_findings(
    groups: &[ConfigGroup],
    scaling: &ScalingAnalysis,
    cv_threshold_pct: f64,
) -> Findings {
    let stability: Vec<StabilityAssessment> = groups
        .iter()
        .map(|g| {
            StabilityAssessment {
                spec: g.spec.clone(),
                cv_pct: g.stats.tps.coefficient_of_variation(),
                stable: g.stats.tps.is_stable(cv_threshold_pct),
            }
        })
        .collect();

    Findings {
        best_tps: find_best_tps_config(groups).map(|g| g.spec.clone()),
        best_latency: find_best_latency_config(groups).map(|g| g.spec.clone()),
        worst_latency: find_worst_latency_config(groups).map(|g| g.spec.clone()),
        knee: scaling.knee.clone(),
        all_stable: stability.iter().all(|s| s.stable),
        stability,
        recommendation: recommend(scaling),
    }
}

/// The group right before a detected, non-baseline knee; otherwise the best score
pub fn recommend(scaling: &ScalingAnalysis) -> Recommendation {
    let knee = &scaling.knee;
    let baseline_idx = scaling.baseline_index();

    if knee.reason.is_detected() && knee.index != baseline_idx && knee.index > 0 {
        let chosen = &scaling.metrics[knee.index - 1];
        return Recommendation {
            spec: chosen.spec.clone(),
            threads: chosen.threads,
            basis: RecommendationBasis::BeforeKnee,
            score: recommendation_score(chosen),
            text: format!(
                "Use {} threads ({}): throughput stops scaling efficiently at {} threads",
                chosen.threads, chosen.spec, knee.threads
            ),
        };
    }

    let chosen = scaling
        .metrics
        .iter()
        .max_by(|a, b| {
            recommendation_score(a)
                .partial_cmp(&recommendation_score(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(&scaling.metrics[baseline_idx]);

    Recommendation {
        spec: chosen.spec.clone(),
        threads: chosen.threads,
        basis: RecommendationBasis::BestScore,
        score: recommendation_score(chosen),
        text: format!(
            "Use {} threads ({}): best throughput for its p95 latency ({:.2}x speedup, p95 {:.2}ms)",
            chosen.threads, chosen.spec, chosen.speedup, chosen.p95_ms
        ),
    }
}
