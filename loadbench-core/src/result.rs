//! Run Results
//!
//! `FinalResult` is the authoritative end-of-run summary extracted from a
//! tool's output. `Run` is the slice of it (plus identity) that the
//! statistics engine aggregates, keyed by `ConfigSpec`.

use crate::config::{DatabaseType, ToolKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// End-of-run aggregate reported by a tool.
///
/// Fields a tool does not report stay zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    /// Tool that produced the output
    pub tool: ToolKind,

    /// Read statements executed
    pub read_queries: u64,
    /// Write statements executed
    pub write_queries: u64,
    /// Other statements (transaction control and the like)
    pub other_queries: u64,
    /// All statements executed
    pub total_queries: u64,
    /// Committed transactions
    pub total_transactions: u64,

    /// Transactions per second over the measured phase
    pub tps: f64,
    /// Queries per second over the measured phase
    pub qps: f64,

    /// Fastest transaction (ms)
    pub latency_min_ms: f64,
    /// Mean transaction latency (ms)
    pub latency_avg_ms: f64,
    /// Slowest transaction (ms)
    pub latency_max_ms: f64,
    /// 95th percentile latency (ms)
    pub latency_p95_ms: f64,
    /// 99th percentile latency (ms)
    pub latency_p99_ms: f64,
    /// Sum of all transaction latencies (ms)
    pub latency_sum_ms: f64,

    /// Errors the tool ignored and retried
    pub ignored_errors: u64,
    /// Reconnects to the database
    pub reconnects: u64,

    /// Wall time of the measured phase (s)
    pub total_time_secs: f64,
    /// Events executed
    pub total_events: u64,

    /// Mean events per thread
    pub events_avg: f64,
    /// Standard deviation of events per thread
    pub events_stddev: f64,
    /// Mean execution time per thread (s)
    pub exec_time_avg_secs: f64,
    /// Standard deviation of execution time per thread (s)
    pub exec_time_stddev_secs: f64,

    /// Tool-specific figures (e.g. `nopm`, `tpmc`)
    #[serde(default)]
    pub tool_metrics: BTreeMap<String, f64>,
}

impl FinalResult {
    /// All-zero result for `tool`
    pub fn empty(tool: ToolKind) -> Self {
        Self {
            tool,
            read_queries: 0,
            write_queries: 0,
            other_queries: 0,
            total_queries: 0,
            total_transactions: 0,
            tps: 0.0,
            qps: 0.0,
            latency_min_ms: 0.0,
            latency_avg_ms: 0.0,
            latency_max_ms: 0.0,
            latency_p95_ms: 0.0,
            latency_p99_ms: 0.0,
            latency_sum_ms: 0.0,
            ignored_errors: 0,
            reconnects: 0,
            total_time_secs: 0.0,
            total_events: 0,
            events_avg: 0.0,
            events_stddev: 0.0,
            exec_time_avg_secs: 0.0,
            exec_time_stddev_secs: 0.0,
            tool_metrics: BTreeMap::new(),
        }
    }

    /// Average queries per transaction (0 when no transactions were recorded)
    pub fn queries_per_transaction(&self) -> f64 {
        if self.total_transactions == 0 {
            0.0
        } else {
            self.total_queries as f64 / self.total_transactions as f64
        }
    }
}

/// Identity of "the same configuration": runs with equal specs are grouped.
///
/// Ordered by thread count first so sorted groups ascend in threads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigSpec {
    /// Concurrency level
    pub threads: u32,
    /// Target database engine
    pub database: DatabaseType,
    /// Template name
    pub template: String,
    /// Connection profile name
    #[serde(default)]
    pub connection: Option<String>,
}

impl ConfigSpec {
    /// Spec without a connection name
    pub fn new(threads: u32, database: DatabaseType, template: impl Into<String>) -> Self {
        Self {
            threads,
            database,
            template: template.into(),
            connection: None,
        }
    }

    /// Attach a connection name
    pub fn with_connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }
}

impl fmt::Display for ConfigSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}t", self.database, self.template, self.threads)?;
        if let Some(conn) = &self.connection {
            write!(f, " ({})", conn)?;
        }
        Ok(())
    }
}

/// One completed execution, the unit of statistical aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Caller-assigned identifier
    pub id: String,
    /// Tool that produced the run
    pub tool: ToolKind,
    /// Grouping identity
    pub spec: ConfigSpec,
    /// Start of the measured phase
    pub started_at: DateTime<Utc>,
    /// End of the measured phase
    pub finished_at: DateTime<Utc>,

    /// Transactions per second
    pub tps: f64,
    /// Queries per second
    pub qps: f64,
    /// Fastest transaction (ms)
    pub latency_min_ms: f64,
    /// Mean latency (ms)
    pub latency_avg_ms: f64,
    /// 95th percentile latency (ms)
    pub latency_p95_ms: f64,
    /// 99th percentile latency (ms)
    pub latency_p99_ms: f64,
    /// Slowest transaction (ms)
    pub latency_max_ms: f64,

    /// Read statements
    pub read_queries: u64,
    /// Write statements
    pub write_queries: u64,
    /// Other statements
    pub other_queries: u64,
    /// All statements
    pub total_queries: u64,
    /// Committed transactions
    pub transactions: u64,

    /// Ignored errors
    pub errors: u64,
    /// Reconnects
    pub reconnects: u64,
}

impl Run {
    /// Derive a run record from an extracted final result
    pub fn from_final_result(
        id: impl Into<String>,
        spec: ConfigSpec,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        result: &FinalResult,
    ) -> Self {
        Self {
            id: id.into(),
            tool: result.tool,
            spec,
            started_at,
            finished_at,
            tps: result.tps,
            qps: result.qps,
            latency_min_ms: result.latency_min_ms,
            latency_avg_ms: result.latency_avg_ms,
            latency_p95_ms: result.latency_p95_ms,
            latency_p99_ms: result.latency_p99_ms,
            latency_max_ms: result.latency_max_ms,
            read_queries: result.read_queries,
            write_queries: result.write_queries,
            other_queries: result.other_queries,
            total_queries: result.total_queries,
            transactions: result.total_transactions,
            errors: result.ignored_errors,
            reconnects: result.reconnects,
        }
    }

    /// Average queries per transaction (0 when no transactions were recorded)
    pub fn queries_per_transaction(&self) -> f64 {
        if self.transactions == 0 {
            0.0
        } else {
            self.total_queries as f64 / self.transactions as f64
        }
    }

    /// Wall-clock length of the measured phase in seconds
    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queries_per_transaction_guards_zero() {
        let mut result = FinalResult::empty(ToolKind::Sysbench);
        assert_eq!(result.queries_per_transaction(), 0.0);
        result.total_queries = 200_000;
        result.total_transactions = 10_000;
        assert!((result.queries_per_transaction() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_spec_orders_by_threads() {
        let mut specs = vec![
            ConfigSpec::new(8, DatabaseType::MySql, "oltp"),
            ConfigSpec::new(1, DatabaseType::PostgreSql, "oltp"),
            ConfigSpec::new(4, DatabaseType::MySql, "oltp"),
        ];
        specs.sort();
        let threads: Vec<u32> = specs.iter().map(|s| s.threads).collect();
        assert_eq!(threads, vec![1, 4, 8]);
    }

    #[test]
    fn test_run_from_final_result() {
        let mut result = FinalResult::empty(ToolKind::Sysbench);
        result.tps = 166.6;
        result.ignored_errors = 3;
        result.total_transactions = 10;
        let now = Utc::now();
        let run = Run::from_final_result(
            "r1",
            ConfigSpec::new(4, DatabaseType::MySql, "oltp_read_write"),
            now,
            now + chrono::Duration::seconds(60),
            &result,
        );
        assert_eq!(run.errors, 3);
        assert_eq!(run.transactions, 10);
        assert!((run.duration_secs() - 60.0).abs() < 1e-9);
        assert_eq!(run.spec.to_string(), "mysql/oltp_read_write@4t");
    }
}
