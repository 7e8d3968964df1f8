#![warn(missing_docs)]
//! loadbench Core - Shared Data Model
//!
//! Types passed between the adapter layer and the analysis engine:
//! - `BenchmarkConfig` describing what to run against which connection
//! - `Command` produced by the per-tool builders
//! - `Sample` streamed while a tool is running
//! - `FinalResult` extracted once a tool finished, and the `Run` record
//!   derived from it for cross-run aggregation

mod command;
mod config;
mod result;
mod sample;
mod secret;

pub use command::{Command, EnvOverride, EnvValue, GeneratedFile};
pub use config::{
    BenchmarkConfig, ConnectionInfo, DatabaseType, ExecutionOptions, ParamValue, Phase, Template,
    ToolKind, UnknownVariant,
};
pub use result::{ConfigSpec, FinalResult, Run};
pub use sample::Sample;
pub use secret::Secret;

/// Lower bound for the `threads` run parameter
pub const MIN_THREADS: u64 = 1;

/// Upper bound for the `threads` run parameter
pub const MAX_THREADS: u64 = 1024;

/// Lower bound for the `time` run parameter, in seconds
pub const MIN_DURATION_SECS: u64 = 10;

/// Upper bound for the `time` run parameter, in seconds (24h)
pub const MAX_DURATION_SECS: u64 = 86_400;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(MIN_THREADS <= MAX_THREADS);
        assert_eq!(MAX_DURATION_SECS, 24 * 60 * 60);
    }
}
