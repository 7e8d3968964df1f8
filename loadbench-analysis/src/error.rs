//! Analysis errors

use thiserror::Error;

/// Errors raised by the comparison entry points
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Too few runs or groups to compare
    #[error("insufficient data: need at least {required} records, got {actual}")]
    InsufficientData {
        /// Minimum needed
        required: usize,
        /// Supplied
        actual: usize,
    },

    /// The requested baseline is not among the groups
    #[error("baseline group with {threads} threads not found")]
    BaselineNotFound {
        /// Thread count of the requested baseline
        threads: u32,
    },
}
