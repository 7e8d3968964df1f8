#![warn(missing_docs)]
//! # loadbench
//!
//! Database load testing on top of existing tools, with cross-run analysis.
//!
//! - **Adapters**: sysbench, HammerDB, Swingbench and tpcc-mysql commands,
//!   realtime telemetry parsing and final-summary extraction
//! - **Statistics**: per-configuration mean, sample stddev, min, max, median
//! - **Scaling**: speedup, efficiency and knee detection across thread counts
//! - **Sanity**: latency ordering, QPS consistency, SQL totals, reliability
//! - **Reports**: serializable comparison reports with a recommendation
//!
//! ## Quick Start
//!
//! ```ignore
//! use loadbench::prelude::*;
//!
//! let config = LoadbenchConfig::discover().unwrap_or_default();
//! loadbench::init_tracing(&config.logging.filter);
//!
//! let registry = AdapterRegistry::builtin();
//! let adapter = registry.get("sysbench")?;
//! let connection = config.connection_profiles()?.default_connection()?;
//! let bench = BenchmarkConfig::new(connection, Template::named("oltp_read_write"))
//!     .with_param("threads", 8i64)
//!     .with_param("time", 60i64);
//!
//! let executor = Executor::from_config(&config)?;
//! let outcome = executor
//!     .run_benchmark(adapter.as_ref(), &bench, &CancellationToken::new())
//!     .await?;
//!
//! let report = compare_runs(&[baseline_run, outcome.run], &config.analysis_policy())?;
//! println!("{}", generate_json_report(&report)?);
//! ```

mod config;
mod executor;
mod logging;
mod profiles;

pub use config::{
    AnalysisConfig, CONFIG_FILE_NAME, ExecutionConfig, LoadbenchConfig, LoggingConfig,
    StreamConfig,
};
pub use executor::{BenchmarkOutcome, ExecutionError, Executor, PhaseOutcome, config_spec};
pub use logging::init_tracing;
pub use profiles::{ConnectionProfile, ConnectionProfiles, ProfileError};

// Re-export core types
pub use loadbench_core::{
    BenchmarkConfig, Command, ConfigSpec, ConnectionInfo, DatabaseType, ExecutionOptions,
    FinalResult, ParamValue, Phase, Run, Sample, Secret, Template, ToolKind,
};

// Re-export adapters
pub use loadbench_adapters::{
    AdapterError, AdapterRegistry, BenchmarkAdapter, CollectedOutput, CollectorSession,
    HammerDbAdapter, StreamCollector, StreamError, SwingbenchAdapter, SysbenchAdapter,
    TelemetryParser, TpccAdapter, ValidationError,
};

// Re-export stats
pub use loadbench_stats::{RunMetricStats, RunStats, aggregate_runs, compute_metric_stats};

// Re-export analysis
pub use loadbench_analysis::{
    AnalysisError, AnalysisPolicy, ConfigGroup, KneePoint, KneeReason, SanityCheck,
    SanityCheckResults, SanityPolicy, ScalingAnalysis, ScalingMetrics, ScalingPolicy,
    analyze_scaling, group_runs, run_sanity_checks,
};

// Re-export report
pub use loadbench_report::{
    ComparisonReport, Findings, Recommendation, SimplifiedReport, build_simplified_report,
    compare_runs, compare_runs_with_baseline, generate_json_report,
};

/// Cancellation token accepted by the collector and executor
pub use tokio_util::sync::CancellationToken;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AdapterRegistry, BenchmarkAdapter, BenchmarkConfig, CancellationToken, ConnectionInfo,
        DatabaseType, Executor, LoadbenchConfig, Run, Template, build_simplified_report,
        compare_runs, generate_json_report,
    };
}
