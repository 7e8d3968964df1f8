//! Scaling Analyzer
//!
//! Speedup and efficiency of each group relative to a baseline, deltas
//! against the previous thread level, and the knee past which adding
//! threads stops paying off.
//!
//! ## Baseline resolution
//!
//! 1. an explicitly requested baseline spec
//! 2. the group with one thread
//! 3. otherwise the lowest-thread group, flagged `baseline_inferred`
//!
//! Efficiency is normalized by the baseline's thread count, so it reduces to
//! `speedup / threads` for a single-thread baseline.

use crate::error::AnalysisError;
use crate::group::ConfigGroup;
use crate::policy::ScalingPolicy;
use loadbench_core::ConfigSpec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Change of a metric against the previous thread level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// Current minus previous
    pub absolute: f64,
    /// Relative change in percent (0 when the previous value is 0)
    pub percent: f64,
}

impl Delta {
    fn between(previous: f64, current: f64) -> Self {
        let absolute = current - previous;
        let percent = if previous == 0.0 {
            0.0
        } else {
            absolute / previous * 100.0
        };
        Self { absolute, percent }
    }
}

/// Scaling figures for one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingMetrics {
    /// Group configuration
    pub spec: ConfigSpec,
    /// Concurrency level
    pub threads: u32,
    /// Mean TPS
    pub tps: f64,
    /// Mean p95 latency (ms)
    pub p95_ms: f64,
    /// TPS relative to the baseline
    pub speedup: f64,
    /// Speedup per unit of added concurrency
    pub efficiency: f64,
    /// None for the first group and for the baseline
    pub tps_delta: Option<Delta>,
    /// None for the first group and for the baseline
    pub p95_delta: Option<Delta>,
    /// This group is the baseline
    pub is_baseline: bool,
}

/// Why a group was chosen as the knee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KneeReason {
    /// Efficiency fell below the policy minimum
    LowEfficiency,
    /// TPS gain over the previous group fell below the policy minimum
    LowTpsGain,
    /// Nothing triggered; the highest-thread group is reported
    NoDiminishingReturns,
}

impl KneeReason {
    /// Whether the knee was detected rather than defaulted
    pub fn is_detected(self) -> bool {
        !matches!(self, KneeReason::NoDiminishingReturns)
    }
}

/// The diminishing-returns point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KneePoint {
    /// Knee configuration
    pub spec: ConfigSpec,
    /// Knee concurrency level
    pub threads: u32,
    /// Index into `ScalingAnalysis::metrics`
    pub index: usize,
    /// Criterion that selected it
    pub reason: KneeReason,
}

/// Result of scaling analysis over a thread-ordered series of groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingAnalysis {
    /// Group every speedup is relative to
    pub baseline: ConfigSpec,
    /// Baseline concurrency level
    pub baseline_threads: u32,
    /// The baseline was neither requested nor a one-thread group
    pub baseline_inferred: bool,
    /// One entry per group, ascending thread count
    pub metrics: Vec<ScalingMetrics>,
    /// Diminishing-returns point
    pub knee: KneePoint,
}

impl ScalingAnalysis {
    /// Metrics of the knee group
    pub fn knee_metrics(&self) -> &ScalingMetrics {
        &self.metrics[self.knee.index]
    }

    /// Index of the baseline within `metrics`
    pub fn baseline_index(&self) -> usize {
        self.metrics
            .iter()
            .position(|m| m.is_baseline)
            .unwrap_or_default()
    }
}

fn by_threads(a: &&ConfigGroup, b: &&ConfigGroup) -> Ordering {
    a.spec.cmp(&b.spec)
}

/// Analyze scaling across `groups`.
///
/// Groups are ordered by thread count internally. Fails with
/// `InsufficientData` for an empty input and `BaselineNotFound` when the
/// requested baseline is not among the groups.
pub fn analyze_scaling(
    groups: &[ConfigGroup],
    baseline: Option<&ConfigSpec>,
    policy: &ScalingPolicy,
) -> Result<ScalingAnalysis, AnalysisError> {
    if groups.is_empty() {
        return Err(AnalysisError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }

    let mut ordered: Vec<&ConfigGroup> = groups.iter().collect();
    ordered.sort_by(by_threads);

    let (baseline_idx, baseline_inferred) = match baseline {
        Some(spec) => {
            let idx = ordered
                .iter()
                .position(|g| &g.spec == spec)
                .ok_or(AnalysisError::BaselineNotFound {
                    threads: spec.threads,
                })?;
            (idx, false)
        }
        None => match ordered.iter().position(|g| g.threads() == 1) {
            Some(idx) => (idx, false),
            None => {
                warn!(
                    threads = ordered[0].threads(),
                    "no single-thread group, using the lowest thread count as baseline"
                );
                (0, true)
            }
        },
    };

    let base = ordered[baseline_idx];
    let base_tps = base.stats.tps.mean;
    let base_threads = base.threads().max(1) as f64;

    let metrics: Vec<ScalingMetrics> = ordered
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let tps = group.stats.tps.mean;
            let p95_ms = group.stats.latency_p95.mean;
            let speedup = if base_tps == 0.0 { 0.0 } else { tps / base_tps };
            let relative_threads = group.threads() as f64 / base_threads;
            let efficiency = if relative_threads == 0.0 {
                0.0
            } else {
                speedup / relative_threads
            };

            let is_baseline = i == baseline_idx;
            let previous = (i > 0 && !is_baseline).then(|| ordered[i - 1]);

            ScalingMetrics {
                spec: group.spec.clone(),
                threads: group.threads(),
                tps,
                p95_ms,
                speedup,
                efficiency,
                tps_delta: previous.map(|p| Delta::between(p.stats.tps.mean, tps)),
                p95_delta: previous.map(|p| Delta::between(p.stats.latency_p95.mean, p95_ms)),
                is_baseline,
            }
        })
        .collect();

    let knee = detect_knee(&metrics, baseline_idx, policy);
    debug!(
        baseline = %base.spec,
        knee_threads = knee.threads,
        reason = ?knee.reason,
        "scaling analysis complete"
    );

    Ok(ScalingAnalysis {
        baseline: base.spec.clone(),
        baseline_threads: base.threads(),
        baseline_inferred,
        metrics,
        knee,
    })
}

/// First non-baseline group with low efficiency or low TPS gain over its
/// predecessor; otherwise the last group.
fn detect_knee(metrics: &[ScalingMetrics], baseline_idx: usize, policy: &ScalingPolicy) -> KneePoint {
    let knee_at = |index: usize, reason: KneeReason| KneePoint {
        spec: metrics[index].spec.clone(),
        threads: metrics[index].threads,
        index,
        reason,
    };

    for (i, m) in metrics.iter().enumerate() {
        if i == baseline_idx {
            continue;
        }
        if m.efficiency < policy.knee_min_efficiency {
            return knee_at(i, KneeReason::LowEfficiency);
        }
        if i > 0 {
            let previous = metrics[i - 1].tps;
            if previous > 0.0 {
                let gain_pct = (m.tps - previous) / previous * 100.0;
                if gain_pct < policy.knee_min_tps_gain_pct {
                    return knee_at(i, KneeReason::LowTpsGain);
                }
            }
        }
    }

    knee_at(metrics.len() - 1, KneeReason::NoDiminishingReturns)
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Group with the highest mean TPS
pub fn find_best_tps_config(groups: &[ConfigGroup]) -> Option<&ConfigGroup> {
    groups
        .iter()
        .max_by(|a, b| cmp_f64(a.stats.tps.mean, b.stats.tps.mean))
}

/// Group with the lowest mean p95 latency, ignoring groups that report none
pub fn find_best_latency_config(groups: &[ConfigGroup]) -> Option<&ConfigGroup> {
    groups
        .iter()
        .filter(|g| g.stats.latency_p95.mean > 0.0)
        .min_by(|a, b| cmp_f64(a.stats.latency_p95.mean, b.stats.latency_p95.mean))
}

/// Group with the highest mean p95 latency
pub fn find_worst_latency_config(groups: &[ConfigGroup]) -> Option<&ConfigGroup> {
    groups
        .iter()
        .max_by(|a, b| cmp_f64(a.stats.latency_p95.mean, b.stats.latency_p95.mean))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::group_runs;
    use crate::test_support::{run, run_with_p95};

    fn analyze(groups: &[ConfigGroup]) -> ScalingAnalysis {
        analyze_scaling(groups, None, &ScalingPolicy::default()).unwrap()
    }

    #[test]
    fn test_near_linear_scaling_has_no_knee() {
        let groups = group_runs(&[
            run(1, 100.0),
            run(1, 100.0),
            run(1, 100.0),
            run(8, 750.0),
        ]);
        assert_eq!(groups[0].stats.tps.mean, 100.0);
        assert_eq!(groups[0].stats.tps.stddev, 0.0);

        let analysis = analyze(&groups);
        let m8 = &analysis.metrics[1];
        assert!((m8.speedup - 7.5).abs() < 1e-9);
        assert!((m8.efficiency - 0.9375).abs() < 1e-9);
        assert_eq!(analysis.knee.threads, 8);
        assert_eq!(analysis.knee.reason, KneeReason::NoDiminishingReturns);
        assert!(!analysis.baseline_inferred);
    }

    #[test]
    fn test_low_efficiency_knee() {
        let groups = group_runs(&[run(1, 100.0), run(4, 150.0)]);
        let analysis = analyze(&groups);
        assert!((analysis.metrics[1].efficiency - 0.375).abs() < 1e-9);
        assert_eq!(analysis.knee.threads, 4);
        assert_eq!(analysis.knee.reason, KneeReason::LowEfficiency);
    }

    #[test]
    fn test_low_gain_knee() {
        // Efficient enough at 2 threads relative to a slow baseline, but the
        // step from 2 to 3 threads gains under 10%
        let policy = ScalingPolicy {
            knee_min_efficiency: 0.5,
            ..ScalingPolicy::default()
        };
        let groups = group_runs(&[run(1, 100.0), run(2, 190.0), run(3, 200.0)]);
        let analysis = analyze_scaling(&groups, None, &policy).unwrap();
        assert_eq!(analysis.knee.threads, 3);
        assert_eq!(analysis.knee.reason, KneeReason::LowTpsGain);
    }

    #[test]
    fn test_baseline_is_identity() {
        let groups = group_runs(&[run(1, 123.0), run(2, 240.0)]);
        let analysis = analyze(&groups);
        let base = &analysis.metrics[0];
        assert!(base.is_baseline);
        assert_eq!(base.speedup, 1.0);
        assert_eq!(base.efficiency, 1.0);
        assert!(base.tps_delta.is_none());

        let delta = analysis.metrics[1].tps_delta.unwrap();
        assert!((delta.absolute - 117.0).abs() < 1e-9);
    }

    #[test]
    fn test_inferred_baseline() {
        let groups = group_runs(&[run(2, 200.0), run(4, 380.0), run(8, 500.0)]);
        let analysis = analyze(&groups);
        assert!(analysis.baseline_inferred);
        assert_eq!(analysis.baseline_threads, 2);
        assert_eq!(analysis.metrics[0].efficiency, 1.0);
        // 380/200 = 1.9 over 2x threads
        assert!((analysis.metrics[1].efficiency - 0.95).abs() < 1e-9);
        // 500/200 = 2.5 over 4x threads
        assert!((analysis.metrics[2].efficiency - 0.625).abs() < 1e-9);
        assert_eq!(analysis.knee.threads, 8);
    }

    #[test]
    fn test_explicit_baseline() {
        let groups = group_runs(&[run(1, 100.0), run(4, 400.0), run(8, 800.0)]);
        let spec = groups[1].spec.clone();
        let analysis = analyze_scaling(&groups, Some(&spec), &ScalingPolicy::default()).unwrap();
        assert_eq!(analysis.baseline_threads, 4);
        assert!(analysis.metrics[1].is_baseline);
        assert!((analysis.metrics[2].speedup - 2.0).abs() < 1e-9);

        let missing = loadbench_core::ConfigSpec::new(16, spec.database, spec.template.clone());
        assert_eq!(
            analyze_scaling(&groups, Some(&missing), &ScalingPolicy::default()).unwrap_err(),
            AnalysisError::BaselineNotFound { threads: 16 }
        );
    }

    #[test]
    fn test_zero_baseline_tps() {
        let groups = group_runs(&[run(1, 0.0), run(2, 100.0)]);
        let analysis = analyze(&groups);
        assert_eq!(analysis.metrics[1].speedup, 0.0);
        assert_eq!(analysis.metrics[1].efficiency, 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            analyze_scaling(&[], None, &ScalingPolicy::default()),
            Err(AnalysisError::InsufficientData { actual: 0, .. })
        ));
    }

    #[test]
    fn test_best_and_worst() {
        let groups = group_runs(&[
            run_with_p95(1, 100.0, 5.0),
            run_with_p95(4, 380.0, 9.0),
            run_with_p95(8, 420.0, 30.0),
        ]);
        assert_eq!(find_best_tps_config(&groups).unwrap().threads(), 8);
        assert_eq!(find_best_latency_config(&groups).unwrap().threads(), 1);
        assert_eq!(find_worst_latency_config(&groups).unwrap().threads(), 8);
        assert!(find_best_tps_config(&[]).is_none());
    }
}
