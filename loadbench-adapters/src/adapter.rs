//! The per-tool capability set

use crate::error::AdapterError;
use loadbench_core::{BenchmarkConfig, Command, DatabaseType, FinalResult, Phase, Sample, ToolKind};
use std::fmt;

/// Line-oriented realtime telemetry parser.
///
/// One parser instance is created per run; implementations may keep state
/// between lines (e.g. the previous report timestamp).
pub trait TelemetryParser: Send {
    /// Parse one output line (without its line terminator).
    ///
    /// Returns `None` for lines that are not telemetry. Never fails.
    fn parse_line(&mut self, line: &str) -> Option<Sample>;
}

/// Builder, validator, collector grammar and extractor for one tool
pub trait BenchmarkAdapter: Send + Sync + fmt::Debug {
    /// Which tool this adapter drives
    fn tool(&self) -> ToolKind;

    /// Database engines the tool can target
    fn supported_databases(&self) -> &'static [DatabaseType];

    /// Whether `database` is in the supported set
    fn supports(&self, database: DatabaseType) -> bool {
        self.supported_databases().contains(&database)
    }

    /// Pre-flight checks for `phase`
    fn validate_config(&self, phase: Phase, config: &BenchmarkConfig) -> Result<(), AdapterError>;

    /// Render the command for `phase`. Validates first.
    fn build_command(&self, phase: Phase, config: &BenchmarkConfig)
    -> Result<Command, AdapterError>;

    /// Command that loads schema and data
    fn build_prepare_command(&self, config: &BenchmarkConfig) -> Result<Command, AdapterError> {
        self.build_command(Phase::Prepare, config)
    }

    /// Command that runs the timed measurement
    fn build_run_command(&self, config: &BenchmarkConfig) -> Result<Command, AdapterError> {
        self.build_command(Phase::Run, config)
    }

    /// Command that removes what prepare created
    fn build_cleanup_command(&self, config: &BenchmarkConfig) -> Result<Command, AdapterError> {
        self.build_command(Phase::Cleanup, config)
    }

    /// Fresh realtime parser for one run
    fn telemetry_parser(&self) -> Box<dyn TelemetryParser>;

    /// Parse the complete captured output of a finished run
    fn extract_final_result(&self, output: &str) -> Result<FinalResult, AdapterError>;
}
