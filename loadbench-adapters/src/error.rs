//! Adapter error taxonomy

use loadbench_core::{DatabaseType, Phase, ToolKind};
use thiserror::Error;

/// Pre-flight configuration problems. Execution must not start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A parameter the phase needs is absent
    #[error("missing required parameter '{name}' for {phase} phase")]
    MissingParameter {
        /// Phase being built
        phase: Phase,
        /// Parameter name
        name: String,
    },

    /// A numeric parameter is outside its allowed range
    #[error("parameter '{name}' = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Parameter name
        name: String,
        /// Supplied value
        value: u64,
        /// Inclusive lower bound
        min: u64,
        /// Inclusive upper bound
        max: u64,
    },

    /// A parameter value is malformed or not allowed
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// Connection fields are missing or malformed
    #[error("invalid connection: {0}")]
    InvalidConnection(String),
}

/// Errors raised by command builders, validators and result extractors
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Configuration rejected before execution
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The tool cannot drive this database engine
    #[error("{tool} does not support {database} databases")]
    UnsupportedDatabase {
        /// Requested tool
        tool: ToolKind,
        /// Requested engine
        database: DatabaseType,
    },

    /// The final summary is missing or malformed
    #[error("unparsable {tool} output: {reason}")]
    UnparsableOutput {
        /// Tool whose output was read
        tool: ToolKind,
        /// What was missing
        reason: String,
    },

    /// Registry lookup by an unknown id
    #[error("no adapter registered for tool '{0}'")]
    UnknownTool(String),
}

impl AdapterError {
    /// Whether the error must abort before any process is spawned
    pub fn is_pre_execution(&self) -> bool {
        matches!(
            self,
            AdapterError::Validation(_)
                | AdapterError::UnsupportedDatabase { .. }
                | AdapterError::UnknownTool(_)
        )
    }
}

/// Failures of the realtime output reader. Scoped to one run.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The underlying read failed
    #[error("failed to read tool output: {0}")]
    Read(#[from] std::io::Error),

    /// The reader task panicked or was aborted
    #[error("collector task failed: {0}")]
    TaskFailed(String),
}
