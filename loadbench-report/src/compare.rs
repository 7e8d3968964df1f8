//! Comparison Entry Points
//!
//! Group → scale → check → conclude, in one call.

use crate::findings::derive_findings;
use crate::report::{ComparisonReport, ReportMeta, SimplifiedPoint, SimplifiedReport};
use loadbench_analysis::{
    AnalysisError, AnalysisPolicy, ConfigGroup, analyze_scaling, group_runs, run_sanity_checks,
};
use loadbench_core::{ConfigSpec, Run};
use tracing::info;

/// Fewest records a comparison accepts
pub const MIN_COMPARISON_RUNS: usize = 2;

fn ensure_enough(runs: &[Run]) -> Result<(), AnalysisError> {
    if runs.len() < MIN_COMPARISON_RUNS {
        return Err(AnalysisError::InsufficientData {
            required: MIN_COMPARISON_RUNS,
            actual: runs.len(),
        });
    }
    Ok(())
}

/// Compare `runs` grouped by configuration, with the baseline resolved
/// automatically.
pub fn compare_runs(
    runs: &[Run],
    policy: &AnalysisPolicy,
) -> Result<ComparisonReport, AnalysisError> {
    compare_runs_with_baseline(runs, None, policy)
}

/// Compare `runs` against an explicit baseline configuration
pub fn compare_runs_with_baseline(
    runs: &[Run],
    baseline: Option<&ConfigSpec>,
    policy: &AnalysisPolicy,
) -> Result<ComparisonReport, AnalysisError> {
    ensure_enough(runs)?;

    let groups = group_runs(runs);
    let scaling = analyze_scaling(&groups, baseline, &policy.scaling)?;
    let sanity = run_sanity_checks(&groups, &policy.sanity);
    let findings = derive_findings(&groups, &scaling, policy.cv_threshold_pct);

    info!(
        runs = runs.len(),
        groups = groups.len(),
        knee_threads = scaling.knee.threads,
        sanity_failed = sanity.failed,
        "comparison report built"
    );

    Ok(ComparisonReport {
        meta: ReportMeta::now(),
        groups,
        scaling,
        sanity,
        findings,
    })
}

/// One point per run, without grouping. Runs lacking query counts get
/// `tps × assumed_queries_per_tx` as their QPS.
pub fn build_simplified_report(
    runs: &[Run],
    policy: &AnalysisPolicy,
) -> Result<SimplifiedReport, AnalysisError> {
    ensure_enough(runs)?;

    let mut ordered: Vec<&Run> = runs.iter().collect();
    ordered.sort_by(|a, b| a.spec.cmp(&b.spec));

    let points: Vec<SimplifiedPoint> = ordered
        .iter()
        .map(|run| {
            let qps_estimated = run.total_queries == 0;
            let qps = if qps_estimated {
                run.tps * policy.assumed_queries_per_tx
            } else {
                run.qps
            };
            SimplifiedPoint {
                run_id: run.id.clone(),
                spec: run.spec.clone(),
                tps: run.tps,
                qps,
                qps_estimated,
                p95_ms: run.latency_p95_ms,
            }
        })
        .collect();

    let groups: Vec<ConfigGroup> = ordered
        .iter()
        .map(|run| ConfigGroup::new(run.spec.clone(), vec![(*run).clone()]))
        .collect();
    let scaling = analyze_scaling(&groups, None, &policy.scaling)?;
    let findings = derive_findings(&groups, &scaling, policy.cv_threshold_pct);

    info!(points = points.len(), "simplified report built");

    Ok(SimplifiedReport {
        meta: ReportMeta::now(),
        points,
        scaling,
        findings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecommendationBasis;
    use chrono::{Duration, Utc};
    use loadbench_analysis::KneeReason;
    use loadbench_core::{DatabaseType, FinalResult, ToolKind};

    fn run_with(threads: u32, tps: f64, p95: f64, with_queries: bool) -> Run {
        let tx = (tps * 60.0) as u64;
        let mut result = FinalResult::empty(ToolKind::Sysbench);
        result.tps = tps;
        result.total_transactions = tx;
        if with_queries {
            result.qps = tps * 20.0;
            result.read_queries = tx * 14;
            result.write_queries = tx * 4;
            result.other_queries = tx * 2;
            result.total_queries = tx * 20;
        }
        result.latency_min_ms = 1.0;
        result.latency_avg_ms = p95 * 0.6;
        result.latency_p95_ms = p95;
        result.latency_p99_ms = p95 * 1.2;
        result.latency_max_ms = p95 * 2.0;

        let start = Utc::now();
        Run::from_final_result(
            format!("run-{}t-{}", threads, tps),
            ConfigSpec::new(threads, DatabaseType::MySql, "oltp_read_write"),
            start,
            start + Duration::seconds(60),
            &result,
        )
    }

    fn run(threads: u32, tps: f64) -> Run {
        run_with(threads, tps, 30.0, true)
    }

    #[test]
    fn test_compare_requires_two_runs() {
        let policy = AnalysisPolicy::default();
        let err = compare_runs(&[run(1, 100.0)], &policy).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientData {
                required: 2,
                actual: 1
            }
        );
        assert!(compare_runs(&[], &policy).is_err());
        assert!(build_simplified_report(&[run(1, 100.0)], &policy).is_err());
    }

    #[test]
    fn test_compare_linear_scaling() {
        let runs = vec![run(1, 100.0), run(1, 100.0), run(1, 100.0), run(8, 750.0)];
        let report = compare_runs(&runs, &AnalysisPolicy::default()).unwrap();

        assert_eq!(report.groups.len(), 2);
        assert!(report.sanity.all_passed, "{:?}", report.sanity);
        assert_eq!(report.findings.knee.threads, 8);
        assert_eq!(report.findings.knee.reason, KneeReason::NoDiminishingReturns);
        assert_eq!(report.findings.best_tps.as_ref().unwrap().threads, 8);
        assert!(report.findings.all_stable);

        // score(1t) = 1 / 4, score(8t) = 7.5 / 4
        let rec = &report.findings.recommendation;
        assert_eq!(rec.basis, RecommendationBasis::BestScore);
        assert_eq!(rec.threads, 8);
    }

    #[test]
    fn test_recommendation_before_knee() {
        let runs = vec![run(1, 100.0), run(2, 190.0), run(4, 200.0)];
        let report = compare_runs(&runs, &AnalysisPolicy::default()).unwrap();

        assert_eq!(report.findings.knee.threads, 4);
        assert!(report.findings.knee.reason.is_detected());
        let rec = &report.findings.recommendation;
        assert_eq!(rec.basis, RecommendationBasis::BeforeKnee);
        assert_eq!(rec.threads, 2);
        assert!(rec.text.contains("2 threads"));
    }

    #[test]
    fn test_unstable_group_flagged() {
        let runs = vec![run(1, 100.0), run(4, 300.0), run(4, 400.0)];
        let report = compare_runs(&runs, &AnalysisPolicy::default()).unwrap();

        assert!(!report.findings.all_stable);
        let four = report
            .findings
            .stability
            .iter()
            .find(|s| s.spec.threads == 4)
            .unwrap();
        assert!(!four.stable);
        assert!(four.cv_pct > 10.0);
    }

    #[test]
    fn test_explicit_baseline_not_found() {
        let runs = vec![run(1, 100.0), run(4, 300.0)];
        let missing = ConfigSpec::new(2, DatabaseType::MySql, "oltp_read_write");
        let err =
            compare_runs_with_baseline(&runs, Some(&missing), &AnalysisPolicy::default())
                .unwrap_err();
        assert_eq!(err, AnalysisError::BaselineNotFound { threads: 2 });
    }

    #[test]
    fn test_simplified_report_estimates_qps() {
        let runs = vec![run_with(4, 150.0, 40.0, false), run(1, 100.0)];
        let report = build_simplified_report(&runs, &AnalysisPolicy::default()).unwrap();

        assert_eq!(report.points.len(), 2);
        assert_eq!(report.points[0].spec.threads, 1);
        assert!(!report.points[0].qps_estimated);
        assert!((report.points[0].qps - 2000.0).abs() < 1e-9);

        let estimated = &report.points[1];
        assert!(estimated.qps_estimated);
        assert!((estimated.qps - 3000.0).abs() < 1e-9);

        assert_eq!(report.findings.knee.threads, 4);
        assert_eq!(report.findings.knee.reason, KneeReason::LowEfficiency);
    }

    #[test]
    fn test_simplified_report_keeps_duplicate_specs_apart() {
        let runs = vec![run(1, 100.0), run(1, 104.0), run(2, 180.0)];
        let report = build_simplified_report(&runs, &AnalysisPolicy::default()).unwrap();
        assert_eq!(report.points.len(), 3);
        assert_eq!(report.scaling.metrics.len(), 3);
    }
}
