//! Sanity Validator
//!
//! A fixed battery of cross-field checks per group. Failures are data, not
//! errors: every check yields a `SanityCheck` with a human-readable detail.

use crate::group::ConfigGroup;
use crate::policy::SanityPolicy;
use loadbench_core::ConfigSpec;
use serde::{Deserialize, Serialize};

/// Check names, in execution order
pub const CHECK_NAMES: [&str; 5] = [
    "latency_ordering",
    "qps_consistency",
    "sql_totals",
    "reliability",
    "single_run_stddev",
];

/// Outcome of one invariant for one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanityCheck {
    /// One of `CHECK_NAMES`
    pub name: String,
    /// Invariant held
    pub passed: bool,
    /// Values compared
    pub detail: String,
}

impl SanityCheck {
    fn new(name: &str, passed: bool, detail: String) -> Self {
        Self {
            name: name.to_string(),
            passed,
            detail,
        }
    }
}

/// All checks of one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSanity {
    /// Group checked
    pub spec: ConfigSpec,
    /// Checks in battery order
    pub checks: Vec<SanityCheck>,
}

impl GroupSanity {
    /// Every check of the group passed
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }
}

/// Sanity results across all groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanityCheckResults {
    /// Per-group results, ascending thread count
    pub groups: Vec<GroupSanity>,
    /// Checks that passed
    pub passed: usize,
    /// Checks that failed
    pub failed: usize,
    /// Conjunction of every check in every group
    pub all_passed: bool,
}

impl SanityCheckResults {
    /// Failed checks with the group they belong to
    pub fn failures(&self) -> impl Iterator<Item = (&ConfigSpec, &SanityCheck)> {
        self.groups
            .iter()
            .flat_map(|g| g.checks.iter().map(move |c| (&g.spec, c)))
            .filter(|(_, c)| !c.passed)
    }
}

/// Run the battery over every group
pub fn run_sanity_checks(groups: &[ConfigGroup], policy: &SanityPolicy) -> SanityCheckResults {
    let groups: Vec<GroupSanity> = groups
        .iter()
        .map(|g| GroupSanity {
            spec: g.spec.clone(),
            checks: check_group(g, policy),
        })
        .collect();

    let total: usize = groups.iter().map(|g| g.checks.len()).sum();
    let passed: usize = groups
        .iter()
        .map(|g| g.checks.iter().filter(|c| c.passed).count())
        .sum();

    SanityCheckResults {
        all_passed: passed == total,
        passed,
        failed: total - passed,
        groups,
    }
}

/// The five checks for one group, in `CHECK_NAMES` order
pub fn check_group(group: &ConfigGroup, policy: &SanityPolicy) -> Vec<SanityCheck> {
    vec![
        latency_ordering(group, policy.latency_tolerance_ms),
        qps_consistency(group, policy.qps_tolerance_pct),
        sql_totals(group),
        reliability(group),
        single_run_stddev(group),
    ]
}

/// min ≤ avg ≤ p95 ≤ p99 ≤ max over group means. Zero means "not reported"
/// and drops out of the chain.
fn latency_ordering(group: &ConfigGroup, tolerance: f64) -> SanityCheck {
    let s = &group.stats;
    let chain = [
        ("min", s.latency_min.mean),
        ("avg", s.latency_avg.mean),
        ("p95", s.latency_p95.mean),
        ("p99", s.latency_p99.mean),
        ("max", s.latency_max.mean),
    ];
    let reported: Vec<(&str, f64)> = chain.into_iter().filter(|(_, v)| *v > 0.0).collect();

    for pair in reported.windows(2) {
        let (lo_name, lo) = pair[0];
        let (hi_name, hi) = pair[1];
        if lo > hi + tolerance {
            return SanityCheck::new(
                CHECK_NAMES[0],
                false,
                format!("{} {:.3}ms exceeds {} {:.3}ms", lo_name, lo, hi_name, hi),
            );
        }
    }

    let detail = if reported.is_empty() {
        "no latency reported".to_string()
    } else {
        reported
            .iter()
            .map(|(name, v)| format!("{}={:.3}", name, v))
            .collect::<Vec<_>>()
            .join(" <= ")
    };
    SanityCheck::new(CHECK_NAMES[0], true, detail)
}

/// |QPS - TPS × queries/tx| / expected within tolerance
fn qps_consistency(group: &ConfigGroup, tolerance_pct: f64) -> SanityCheck {
    let s = &group.stats;
    let expected = s.tps.mean * s.avg_queries_per_tx;
    if expected == 0.0 {
        return SanityCheck::new(
            CHECK_NAMES[1],
            false,
            "expected QPS is 0 (no transaction or query counts)".to_string(),
        );
    }

    let deviation_pct = (s.qps.mean - expected).abs() / expected * 100.0;
    SanityCheck::new(
        CHECK_NAMES[1],
        deviation_pct <= tolerance_pct,
        format!(
            "QPS {:.2} vs expected {:.2} ({:.2}% off, limit {:.1}%)",
            s.qps.mean, expected, deviation_pct, tolerance_pct
        ),
    )
}

/// read + write + other == total on the first run
fn sql_totals(group: &ConfigGroup) -> SanityCheck {
    let Some(run) = group.runs.first() else {
        return SanityCheck::new(CHECK_NAMES[2], false, "group has no runs".to_string());
    };
    let sum = run.read_queries + run.write_queries + run.other_queries;
    SanityCheck::new(
        CHECK_NAMES[2],
        sum == run.total_queries,
        format!(
            "read {} + write {} + other {} = {} (total {})",
            run.read_queries, run.write_queries, run.other_queries, sum, run.total_queries
        ),
    )
}

fn reliability(group: &ConfigGroup) -> SanityCheck {
    let s = &group.stats;
    SanityCheck::new(
        CHECK_NAMES[3],
        !s.has_errors,
        format!("{} errors, {} reconnects", s.total_errors, s.total_reconnects),
    )
}

/// A single run cannot have spread
fn single_run_stddev(group: &ConfigGroup) -> SanityCheck {
    let s = &group.stats;
    if s.run_count != 1 {
        return SanityCheck::new(
            CHECK_NAMES[4],
            true,
            format!("N={}, not applicable", s.run_count),
        );
    }
    let metrics = [
        &s.tps,
        &s.qps,
        &s.latency_avg,
        &s.latency_p95,
        &s.latency_p99,
        &s.latency_min,
        &s.latency_max,
    ];
    let degenerate = metrics
        .iter()
        .all(|m| m.stddev == 0.0 && m.min == m.max && m.mean == m.min);
    SanityCheck::new(
        CHECK_NAMES[4],
        degenerate,
        if degenerate {
            "N=1, stddev 0".to_string()
        } else {
            "N=1 but non-zero spread".to_string()
        },
    )
}
