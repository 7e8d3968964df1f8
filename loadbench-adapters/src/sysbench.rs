//! sysbench Adapter
//!
//! Drives the sysbench OLTP Lua workloads against MySQL or PostgreSQL.
//!
//! ## Realtime output
//!
//! ```text
//! [ 10s ] thds: 4 tps: 166.57 qps: 3335.36 (r/w/o: 2335.04/667.08/333.24) lat (ms,95%): 34.33 err/s: 0.00 reconn/s: 0.00
//! ```
//!
//! The `[ Ns ]` marker is required; every metric after it is optional.
//!
//! ## Summary
//!
//! `SQL statistics:`, `General statistics:`, `Latency (ms):` and
//! `Threads fairness:` blocks printed when the run finishes.

use crate::adapter::{BenchmarkAdapter, TelemetryParser};
use crate::error::{AdapterError, ValidationError};
use crate::text::{cached, capture_f64, capture_u64, section};
use crate::validate::{self, THREADS, TIME};
use loadbench_core::{
    BenchmarkConfig, Command, DatabaseType, FinalResult, Phase, Sample, ToolKind,
};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const SUPPORTED: &[DatabaseType] = &[DatabaseType::MySql, DatabaseType::PostgreSql];

/// Workload used when the template names none
pub const DEFAULT_WORKLOAD: &str = "oltp_read_write";

const KNOWN_WORKLOADS: &[&str] = &[
    "oltp_read_write",
    "oltp_read_only",
    "oltp_write_only",
    "oltp_point_select",
    "oltp_insert",
    "oltp_delete",
    "oltp_update_index",
    "oltp_update_non_index",
    "select_random_points",
    "select_random_ranges",
    "bulk_insert",
];

const DEFAULT_TABLES: u64 = 10;
const DEFAULT_TABLE_SIZE: u64 = 100_000;
const DEFAULT_PERCENTILE: u64 = 95;

/// Parameters consumed by the builder; everything else is passed through
const RESERVED: &[&str] = &[
    THREADS,
    TIME,
    "tables",
    "table_size",
    "percentile",
    "report_interval",
    "warmup_time",
];

/// sysbench adapter
#[derive(Debug, Default, Clone, Copy)]
pub struct SysbenchAdapter;

impl SysbenchAdapter {
    /// Workload script for `config`
    pub fn workload(config: &BenchmarkConfig) -> String {
        if let Some(workload) = &config.template.workload {
            return workload.clone();
        }
        let name = config.template.name.as_str();
        if KNOWN_WORKLOADS.contains(&name) {
            name.to_string()
        } else {
            DEFAULT_WORKLOAD.to_string()
        }
    }
}

impl BenchmarkAdapter for SysbenchAdapter {
    fn tool(&self) -> ToolKind {
        ToolKind::Sysbench
    }

    fn supported_databases(&self) -> &'static [DatabaseType] {
        SUPPORTED
    }

    fn validate_config(&self, phase: Phase, config: &BenchmarkConfig) -> Result<(), AdapterError> {
        validate::validate_common(self.tool(), SUPPORTED, phase, config, &[])?;

        validate::optional_u64(config, "tables")?;
        validate::optional_u64(config, "table_size")?;
        match validate::optional_u64(config, "percentile")? {
            Some(pct) if !(1..=100).contains(&pct) => Err(ValidationError::OutOfRange {
                name: "percentile".to_string(),
                value: pct,
                min: 1,
                max: 100,
            }
            .into()),
            _ => Ok(()),
        }
    }

    fn build_command(
        &self,
        phase: Phase,
        config: &BenchmarkConfig,
    ) -> Result<Command, AdapterError> {
        self.validate_config(phase, config)?;

        let conn = &config.connection;
        let driver = match conn.database {
            DatabaseType::PostgreSql => "pgsql",
            _ => "mysql",
        };

        let mut cmd = Command::new("sysbench", &config.working_dir);
        cmd.arg(Self::workload(config))
            .arg(format!("--db-driver={}", driver))
            .arg(format!("--{}-host={}", driver, conn.host))
            .arg(format!("--{}-port={}", driver, conn.port))
            .arg(format!("--{}-user={}", driver, conn.user))
            .arg(format!("--{}-db={}", driver, conn.database_name))
            .arg(format!(
                "--tables={}",
                validate::u64_or(config, "tables", DEFAULT_TABLES)?
            ))
            .arg(format!(
                "--table-size={}",
                validate::u64_or(config, "table_size", DEFAULT_TABLE_SIZE)?
            ));

        match phase {
            Phase::Run => {
                let bounds = validate::run_bounds(config)?;
                let interval = validate::u64_or(
                    config,
                    "report_interval",
                    config.options.report_interval_secs.max(1),
                )?;
                let warmup = validate::u64_or(config, "warmup_time", config.options.warmup_secs)?;

                cmd.arg(format!("--threads={}", bounds.threads))
                    .arg(format!("--time={}", bounds.time_secs))
                    .arg(format!("--report-interval={}", interval))
                    .arg(format!(
                        "--percentile={}",
                        validate::u64_or(config, "percentile", DEFAULT_PERCENTILE)?
                    ));
                if warmup > 0 {
                    cmd.arg(format!("--warmup-time={}", warmup));
                }
            }
            Phase::Prepare => {
                // Parallel loading when a thread count is given
                if let Some(threads) = validate::optional_u64(config, THREADS)? {
                    cmd.arg(format!("--threads={}", threads));
                }
            }
            Phase::Cleanup => {}
        }

        for (name, value) in validate::passthrough(config, RESERVED) {
            cmd.arg(format!("--{}={}", name.replace('_', "-"), value.to_arg()));
        }

        cmd.arg(phase.as_str());

        if let Some(password) = conn.password.as_ref().filter(|p| !p.is_empty()) {
            let var = match conn.database {
                DatabaseType::PostgreSql => "PGPASSWORD",
                _ => "MYSQL_PWD",
            };
            cmd.secret_env(var, password.clone());
        }

        Ok(cmd)
    }

    fn telemetry_parser(&self) -> Box<dyn TelemetryParser> {
        Box::new(SysbenchParser)
    }

    fn extract_final_result(&self, output: &str) -> Result<FinalResult, AdapterError> {
        extract(output)
    }
}

/// Parses `[ Ns ] ...` interval report lines
#[derive(Debug, Default)]
pub struct SysbenchParser;

impl TelemetryParser for SysbenchParser {
    fn parse_line(&mut self, line: &str) -> Option<Sample> {
        static MARKER: OnceLock<Regex> = OnceLock::new();
        static THDS: OnceLock<Regex> = OnceLock::new();
        static TPS: OnceLock<Regex> = OnceLock::new();
        static QPS: OnceLock<Regex> = OnceLock::new();
        static LAT: OnceLock<Regex> = OnceLock::new();
        static ERR: OnceLock<Regex> = OnceLock::new();

        let marker = cached(&MARKER, r"^\s*\[\s*(\d+(?:\.\d+)?)s\s*\]");
        let elapsed = capture_f64(marker, line, 1)?;

        let mut sample = Sample::from_line(line);
        sample.elapsed_secs = Some(elapsed);
        sample.active_threads = capture_u64(cached(&THDS, r"thds:\s*(\d+)"), line, 1)
            .and_then(|t| u32::try_from(t).ok());
        sample.tps = capture_f64(cached(&TPS, r"\btps:\s*(\d+(?:\.\d+)?)"), line, 1);
        sample.qps = capture_f64(cached(&QPS, r"\bqps:\s*(\d+(?:\.\d+)?)"), line, 1);
        sample.error_rate = capture_f64(cached(&ERR, r"err/s:\s*(\d+(?:\.\d+)?)"), line, 1);

        let lat = cached(&LAT, r"lat \(ms,(\d+(?:\.\d+)?)%\):\s*(\d+(?:\.\d+)?)");
        if let Some(caps) = lat.captures(line) {
            let pct: f64 = caps[1].parse().ok()?;
            let value: f64 = caps[2].parse().ok()?;
            if pct >= 99.0 {
                sample.latency_p99_ms = Some(value);
            } else {
                sample.latency_p95_ms = Some(value);
            }
        }

        sample.has_metrics().then_some(sample)
    }
}

fn extract(output: &str) -> Result<FinalResult, AdapterError> {
    static TRANSACTIONS: OnceLock<Regex> = OnceLock::new();
    static QUERIES: OnceLock<Regex> = OnceLock::new();
    static COUNTER: OnceLock<Regex> = OnceLock::new();
    static TOTAL_TIME: OnceLock<Regex> = OnceLock::new();
    static EVENTS: OnceLock<Regex> = OnceLock::new();
    static LATENCY: OnceLock<Regex> = OnceLock::new();
    static PERCENTILE: OnceLock<Regex> = OnceLock::new();
    static FAIRNESS: OnceLock<Regex> = OnceLock::new();

    let transactions = cached(
        &TRANSACTIONS,
        r"(?m)^\s*transactions:\s+(\d+)\s+\((\d+(?:\.\d+)?) per sec\.\)",
    );
    let sql = section(output, "SQL statistics:").unwrap_or_default();
    let general = section(output, "General statistics:").unwrap_or_default();
    let latency_block = section(output, "Latency (ms):").unwrap_or_default();
    let fairness_block = section(output, "Threads fairness:").unwrap_or_default();

    let Some(tx) = transactions.captures(sql) else {
        return Err(AdapterError::UnparsableOutput {
            tool: ToolKind::Sysbench,
            reason: "no 'transactions:' line in SQL statistics".to_string(),
        });
    };

    let mut result = FinalResult::empty(ToolKind::Sysbench);
    result.total_transactions = tx[1].parse().unwrap_or(0);
    result.tps = tx[2].parse().unwrap_or(0.0);

    let queries = cached(
        &QUERIES,
        r"(?m)^\s*queries:\s+(\d+)\s+\((\d+(?:\.\d+)?) per sec\.\)",
    );
    if let Some(q) = queries.captures(sql) {
        result.qps = q[2].parse().unwrap_or(0.0);
    }

    // "read:", "write:", "other:", "total:", "ignored errors:", "reconnects:"
    let counter = cached(
        &COUNTER,
        r"(?m)^\s*(read|write|other|total|ignored errors|reconnects):\s+(\d+)",
    );
    for caps in counter.captures_iter(sql) {
        let value: u64 = caps[2].parse().unwrap_or(0);
        match &caps[1] {
            "read" => result.read_queries = value,
            "write" => result.write_queries = value,
            "other" => result.other_queries = value,
            "total" => result.total_queries = value,
            "ignored errors" => result.ignored_errors = value,
            "reconnects" => result.reconnects = value,
            _ => {}
        }
    }

    result.total_time_secs = capture_f64(
        cached(&TOTAL_TIME, r"total time:\s+(\d+(?:\.\d+)?)s"),
        general,
        1,
    )
    .unwrap_or(0.0);
    result.total_events = capture_u64(
        cached(&EVENTS, r"total number of events:\s+(\d+)"),
        general,
        1,
    )
    .unwrap_or(0);

    let latency = cached(
        &LATENCY,
        r"(?m)^\s*(min|avg|max|sum):\s+(\d+(?:\.\d+)?)\s*$",
    );
    for caps in latency.captures_iter(latency_block) {
        let value: f64 = caps[2].parse().unwrap_or(0.0);
        match &caps[1] {
            "min" => result.latency_min_ms = value,
            "avg" => result.latency_avg_ms = value,
            "max" => result.latency_max_ms = value,
            "sum" => result.latency_sum_ms = value,
            _ => {}
        }
    }

    let percentile = cached(
        &PERCENTILE,
        r"(?m)^\s*(\d+)th percentile:\s+(\d+(?:\.\d+)?)",
    );
    for caps in percentile.captures_iter(latency_block) {
        let pct: u64 = caps[1].parse().unwrap_or(0);
        let value: f64 = caps[2].parse().unwrap_or(0.0);
        if pct >= 99 {
            result.latency_p99_ms = value;
        } else {
            result.latency_p95_ms = value;
        }
    }

    let fairness = cached(
        &FAIRNESS,
        r"(events|execution time) \(avg/stddev\):\s+(\d+(?:\.\d+)?)/(\d+(?:\.\d+)?)",
    );
    for caps in fairness.captures_iter(fairness_block) {
        let avg: f64 = caps[2].parse().unwrap_or(0.0);
        let stddev: f64 = caps[3].parse().unwrap_or(0.0);
        if &caps[1] == "events" {
            result.events_avg = avg;
            result.events_stddev = stddev;
        } else {
            result.exec_time_avg_secs = avg;
            result.exec_time_stddev_secs = stddev;
        }
    }

    debug!(
        tps = result.tps,
        qps = result.qps,
        transactions = result.total_transactions,
        "parsed sysbench summary"
    );

    Ok(result)
}
