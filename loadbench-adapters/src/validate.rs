//! Shared Pre-flight Validation
//!
//! Checks every tool applies before building a command:
//! - the target database is in the tool's supported set
//! - the connection has a host, port and user
//! - no parameter carries a credential (it would end up on a command line)
//! - `threads` and `time` are present and in range for the run phase

use crate::error::{AdapterError, ValidationError};
use loadbench_core::{
    BenchmarkConfig, DatabaseType, MAX_DURATION_SECS, MAX_THREADS, MIN_DURATION_SECS,
    MIN_THREADS, ParamValue, Phase, ToolKind,
};

/// Run-phase concurrency parameter
pub const THREADS: &str = "threads";

/// Run-phase duration parameter, in seconds
pub const TIME: &str = "time";

const SECRET_MARKERS: [&str; 5] = ["password", "passwd", "pwd", "secret", "token"];

/// Validated run-phase bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunBounds {
    pub threads: u64,
    pub time_secs: u64,
}

/// Checks shared by all tools. `required` lists extra phase-required parameters.
pub(crate) fn validate_common(
    tool: ToolKind,
    supported: &[DatabaseType],
    phase: Phase,
    config: &BenchmarkConfig,
    required: &[&str],
) -> Result<(), AdapterError> {
    let database = config.connection.database;
    if !supported.contains(&database) {
        return Err(AdapterError::UnsupportedDatabase { tool, database });
    }

    check_connection(config)?;
    check_no_secret_params(config)?;

    if phase == Phase::Run {
        run_bounds(config)?;
    }

    for name in required {
        require_u64(config, phase, name)?;
    }

    Ok(())
}

fn check_connection(config: &BenchmarkConfig) -> Result<(), ValidationError> {
    let conn = &config.connection;
    if conn.host.trim().is_empty() {
        return Err(ValidationError::InvalidConnection("host is empty".to_string()));
    }
    if conn.port == 0 {
        return Err(ValidationError::InvalidConnection("port is 0".to_string()));
    }
    if conn.user.trim().is_empty() {
        return Err(ValidationError::InvalidConnection("user is empty".to_string()));
    }
    Ok(())
}

fn check_no_secret_params(config: &BenchmarkConfig) -> Result<(), ValidationError> {
    for name in config.parameters.keys() {
        let lowered = name.to_lowercase();
        if SECRET_MARKERS.iter().any(|m| lowered.contains(m)) {
            return Err(ValidationError::InvalidParameter {
                name: name.clone(),
                reason: "credentials must be supplied through the connection, not parameters"
                    .to_string(),
            });
        }
    }
    Ok(())
}

/// `threads` and `time`, both required and range-checked
pub(crate) fn run_bounds(config: &BenchmarkConfig) -> Result<RunBounds, ValidationError> {
    let threads = require_u64(config, Phase::Run, THREADS)?;
    check_range(THREADS, threads, MIN_THREADS, MAX_THREADS)?;

    let time_secs = require_u64(config, Phase::Run, TIME)?;
    check_range(TIME, time_secs, MIN_DURATION_SECS, MAX_DURATION_SECS)?;

    Ok(RunBounds { threads, time_secs })
}

fn check_range(name: &str, value: u64, min: u64, max: u64) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            name: name.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Integer parameter that must be present for `phase`
pub(crate) fn require_u64(
    config: &BenchmarkConfig,
    phase: Phase,
    name: &str,
) -> Result<u64, ValidationError> {
    optional_u64(config, name)?.ok_or_else(|| ValidationError::MissingParameter {
        phase,
        name: name.to_string(),
    })
}

/// Integer parameter that may be absent
pub(crate) fn optional_u64(
    config: &BenchmarkConfig,
    name: &str,
) -> Result<Option<u64>, ValidationError> {
    match config.param(name) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| ValidationError::InvalidParameter {
                name: name.to_string(),
                reason: format!("expected a non-negative integer, got {}", value.to_arg()),
            }),
    }
}

/// Integer parameter with a fallback
pub(crate) fn u64_or(
    config: &BenchmarkConfig,
    name: &str,
    default: u64,
) -> Result<u64, ValidationError> {
    Ok(optional_u64(config, name)?.unwrap_or(default))
}

/// Parameters not consumed by the builder, in name order
pub(crate) fn passthrough<'a>(
    config: &'a BenchmarkConfig,
    reserved: &'a [&'a str],
) -> impl Iterator<Item = (&'a String, &'a ParamValue)> + 'a {
    config
        .parameters
        .iter()
        .filter(move |(name, _)| !reserved.contains(&name.as_str()))
}

/// Whole minutes covering `secs`, at least `floor`
pub(crate) fn minutes_ceil(secs: u64, floor: u64) -> u64 {
    secs.div_ceil(60).max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadbench_core::{ConnectionInfo, Template};

    fn config() -> BenchmarkConfig {
        BenchmarkConfig::new(
            ConnectionInfo::new(DatabaseType::MySql, "db1", "sbtest", "sbtest"),
            Template::named("oltp"),
        )
    }

    const MYSQL_ONLY: &[DatabaseType] = &[DatabaseType::MySql];

    #[test]
    fn test_threads_and_time_required_only_for_run() {
        let cfg = config();
        assert!(validate_common(ToolKind::Sysbench, MYSQL_ONLY, Phase::Prepare, &cfg, &[]).is_ok());
        assert!(validate_common(ToolKind::Sysbench, MYSQL_ONLY, Phase::Cleanup, &cfg, &[]).is_ok());

        let err = validate_common(ToolKind::Sysbench, MYSQL_ONLY, Phase::Run, &cfg, &[]).unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Validation(ValidationError::MissingParameter { ref name, phase: Phase::Run })
                if name == "threads"
        ));
    }

    #[test]
    fn test_run_bounds() {
        let cfg = config().with_param("threads", 0i64).with_param("time", 60i64);
        assert!(matches!(
            run_bounds(&cfg),
            Err(ValidationError::OutOfRange { ref name, value: 0, .. }) if name == "threads"
        ));

        let cfg = config().with_param("threads", 1025i64).with_param("time", 60i64);
        assert!(matches!(run_bounds(&cfg), Err(ValidationError::OutOfRange { .. })));

        let cfg = config().with_param("threads", 8i64).with_param("time", 9i64);
        assert!(matches!(
            run_bounds(&cfg),
            Err(ValidationError::OutOfRange { ref name, min: 10, .. }) if name == "time"
        ));

        let cfg = config().with_param("threads", 1024i64).with_param("time", 86_400i64);
        assert_eq!(
            run_bounds(&cfg).unwrap(),
            RunBounds {
                threads: 1024,
                time_secs: 86_400
            }
        );
    }

    #[test]
    fn test_unsupported_database() {
        let mut cfg = config();
        cfg.connection.database = DatabaseType::Oracle;
        let err = validate_common(ToolKind::Tpcc, MYSQL_ONLY, Phase::Prepare, &cfg, &[]).unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedDatabase { .. }));
    }

    #[test]
    fn test_secret_parameters_rejected() {
        let cfg = config().with_param("mysql_password", "x");
        let err = validate_common(ToolKind::Sysbench, MYSQL_ONLY, Phase::Prepare, &cfg, &[]).unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Validation(ValidationError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_non_integer_parameter() {
        let cfg = config().with_param("threads", "eight").with_param("time", 60i64);
        assert!(matches!(
            run_bounds(&cfg),
            Err(ValidationError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_empty_host_rejected() {
        let mut cfg = config();
        cfg.connection.host = " ".to_string();
        let err = validate_common(ToolKind::Sysbench, MYSQL_ONLY, Phase::Prepare, &cfg, &[]).unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Validation(ValidationError::InvalidConnection(_))
        ));
    }

    #[test]
    fn test_minutes_ceil() {
        assert_eq!(minutes_ceil(0, 1), 1);
        assert_eq!(minutes_ceil(60, 1), 1);
        assert_eq!(minutes_ceil(61, 1), 2);
        assert_eq!(minutes_ceil(0, 0), 0);
    }
}
