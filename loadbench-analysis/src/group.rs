//! Configuration Groups
//!
//! Runs with equal `ConfigSpec`s form one group. Group statistics are
//! independent, so they are computed in parallel.

use fxhash::FxHashMap;
use loadbench_core::{ConfigSpec, Run};
use loadbench_stats::{RunStats, aggregate_runs};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Runs sharing one configuration, with their aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigGroup {
    /// Shared configuration
    pub spec: ConfigSpec,
    /// Member runs in input order
    pub runs: Vec<Run>,
    /// Aggregate over `runs`
    pub stats: RunStats,
}

impl ConfigGroup {
    /// Group `runs` under `spec` and aggregate them
    pub fn new(spec: ConfigSpec, runs: Vec<Run>) -> Self {
        let stats = aggregate_runs(&runs);
        Self { spec, runs, stats }
    }

    /// Concurrency level of the group
    pub fn threads(&self) -> u32 {
        self.spec.threads
    }
}

/// Partition `runs` by spec, sorted ascending by thread count (then by the
/// remaining spec fields). Run order inside a group is preserved.
pub fn group_runs(runs: &[Run]) -> Vec<ConfigGroup> {
    let mut by_spec: FxHashMap<ConfigSpec, Vec<Run>> = FxHashMap::default();
    for run in runs {
        by_spec.entry(run.spec.clone()).or_default().push(run.clone());
    }

    let mut partitions: Vec<(ConfigSpec, Vec<Run>)> = by_spec.into_iter().collect();
    partitions.sort_by(|a, b| a.0.cmp(&b.0));

    partitions
        .into_par_iter()
        .map(|(spec, runs)| ConfigGroup::new(spec, runs))
        .collect()
}
