//! tpcc-mysql Adapter
//!
//! `tpcc_load` builds the warehouses, `tpcc_start` runs the measurement and
//! cleanup drops the nine TPC-C tables through the `mysql` client.
//!
//! Interval lines:
//!
//! ```text
//!   10, trx: 1234, 95%: 12.345, 99%: 20.111, max_rt: 30.111, 1230|40.123, 123|10.1, 123|50.1, 124|60.1
//! ```
//!
//! Summary:
//!
//! ```text
//! <Raw Results>
//!   [0] sc:1234 lt:0  rt:0  fl:0 avg_rt: 5.2 (5)
//!   ...
//!  in 60 sec.
//!
//! <TpmC>
//!                  7404.000 TpmC
//! ```

use crate::adapter::{BenchmarkAdapter, TelemetryParser};
use crate::error::AdapterError;
use crate::text::{cached, capture_f64};
use crate::validate::{self, THREADS, TIME};
use loadbench_core::{
    BenchmarkConfig, Command, DatabaseType, FinalResult, Phase, Sample, ToolKind,
};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const SUPPORTED: &[DatabaseType] = &[DatabaseType::MySql];

const WAREHOUSES: &str = "warehouses";

/// Tables created by `tpcc_load`
pub const TABLES: [&str; 9] = [
    "warehouse",
    "district",
    "customer",
    "history",
    "new_orders",
    "orders",
    "order_line",
    "item",
    "stock",
];

/// tpcc-mysql adapter
#[derive(Debug, Default, Clone, Copy)]
pub struct TpccAdapter;

impl TpccAdapter {
    fn connection_args(cmd: &mut Command, config: &BenchmarkConfig) {
        let conn = &config.connection;
        cmd.args(["-h", conn.host.as_str()])
            .args(["-P".to_string(), conn.port.to_string()])
            .args(["-d", conn.database_name.as_str()])
            .args(["-u", conn.user.as_str()]);
    }
}

impl BenchmarkAdapter for TpccAdapter {
    fn tool(&self) -> ToolKind {
        ToolKind::Tpcc
    }

    fn supported_databases(&self) -> &'static [DatabaseType] {
        SUPPORTED
    }

    fn validate_config(&self, phase: Phase, config: &BenchmarkConfig) -> Result<(), AdapterError> {
        let required: &[&str] = match phase {
            Phase::Prepare | Phase::Run => &[WAREHOUSES],
            Phase::Cleanup => &[],
        };
        validate::validate_common(self.tool(), SUPPORTED, phase, config, required)?;
        validate::optional_u64(config, "rampup")?;
        Ok(())
    }

    fn build_command(
        &self,
        phase: Phase,
        config: &BenchmarkConfig,
    ) -> Result<Command, AdapterError> {
        self.validate_config(phase, config)?;

        let conn = &config.connection;
        let mut cmd = match phase {
            Phase::Prepare => {
                let warehouses = validate::require_u64(config, phase, WAREHOUSES)?;
                let mut cmd = Command::new("tpcc_load", &config.working_dir);
                Self::connection_args(&mut cmd, config);
                cmd.args(["-w".to_string(), warehouses.to_string()]);
                cmd
            }
            Phase::Run => {
                let warehouses = validate::require_u64(config, phase, WAREHOUSES)?;
                let bounds = validate::run_bounds(config)?;
                let rampup = validate::u64_or(config, "rampup", config.options.warmup_secs)?;
                let interval = config.options.report_interval_secs.max(1);

                let mut cmd = Command::new("tpcc_start", &config.working_dir);
                Self::connection_args(&mut cmd, config);
                cmd.args(["-w".to_string(), warehouses.to_string()])
                    .args(["-c".to_string(), bounds.threads.to_string()])
                    .args(["-r".to_string(), rampup.to_string()])
                    .args(["-l".to_string(), bounds.time_secs.to_string()])
                    .args(["-i".to_string(), interval.to_string()]);
                cmd
            }
            Phase::Cleanup => {
                let mut cmd = Command::new("mysql", &config.working_dir);
                cmd.args(["-h", conn.host.as_str()])
                    .args(["-P".to_string(), conn.port.to_string()])
                    .args(["-u", conn.user.as_str()])
                    .arg(conn.database_name.clone())
                    .arg("-e")
                    .arg(format!("DROP TABLE IF EXISTS {}", TABLES.join(", ")));
                cmd
            }
        };

        for (name, _) in validate::passthrough(config, &[THREADS, TIME, WAREHOUSES, "rampup"]) {
            debug!(parameter = %name, "tpcc-mysql ignores parameter");
        }

        if let Some(password) = &conn.password {
            cmd.secret_env("MYSQL_PWD", password.clone());
        }
        Ok(cmd)
    }

    fn telemetry_parser(&self) -> Box<dyn TelemetryParser> {
        Box::new(TpccParser::default())
    }

    fn extract_final_result(&self, output: &str) -> Result<FinalResult, AdapterError> {
        extract(output)
    }
}

/// Parses interval lines; TPS needs the previous interval's timestamp
#[derive(Debug, Default)]
pub struct TpccParser {
    prev_secs: f64,
}

impl TelemetryParser for TpccParser {
    fn parse_line(&mut self, line: &str) -> Option<Sample> {
        static INTERVAL: OnceLock<Regex> = OnceLock::new();
        let re = cached(
            &INTERVAL,
            r"^\s*(\d+),\s*trx:\s*(\d+),\s*95%:\s*([^,\s]+),\s*99%:\s*([^,\s]+),\s*max_rt:\s*([^,\s]+)",
        );
        let caps = re.captures(line)?;
        let secs: f64 = caps[1].parse().ok()?;
        let trx: f64 = caps[2].parse().ok()?;

        let mut sample = Sample::from_line(line);
        sample.elapsed_secs = Some(secs);
        let dt = secs - self.prev_secs;
        sample.tps = (dt > 0.0).then(|| trx / dt);
        // Idle intervals report "-nan"
        sample.latency_p95_ms = finite(&caps[3]);
        sample.latency_p99_ms = finite(&caps[4]);
        self.prev_secs = secs;
        Some(sample)
    }
}

fn extract(output: &str) -> Result<FinalResult, AdapterError> {
    static TPMC: OnceLock<Regex> = OnceLock::new();
    static RAW: OnceLock<Regex> = OnceLock::new();
    static DURATION: OnceLock<Regex> = OnceLock::new();

    let tpmc = output
        .find("<TpmC>")
        .and_then(|start| capture_f64(cached(&TPMC, r"(\d+(?:\.\d+)?)\s*TpmC"), &output[start..], 1))
        .ok_or_else(|| AdapterError::UnparsableOutput {
            tool: ToolKind::Tpcc,
            reason: "no <TpmC> block".to_string(),
        })?;

    let mut result = FinalResult::empty(ToolKind::Tpcc);
    result.tps = tpmc / 60.0;
    result.tool_metrics.insert("tpmc".to_string(), tpmc);

    // Only the first raw block; "Raw Results2" repeats the sums
    if let Some(start) = output.find("<Raw Results>") {
        let block = &output[start..];
        let block = match block.find("<Raw Results2") {
            Some(end) => &block[..end],
            None => block,
        };

        let raw = cached(
            &RAW,
            r"\[(\d)\]\s*sc:\s*(\d+)\s+lt:\s*(\d+)\s+rt:\s*(\d+)\s+fl:\s*(\d+)(?:\s+avg_rt:\s*(\d+(?:\.\d+)?))?",
        );
        for caps in raw.captures_iter(block) {
            let sc: u64 = caps[2].parse().unwrap_or(0);
            let lt: u64 = caps[3].parse().unwrap_or(0);
            let fl: u64 = caps[5].parse().unwrap_or(0);
            result.total_transactions += sc + lt;
            result.ignored_errors += fl;
            // New-Order latency, the transaction TpmC counts
            if &caps[1] == "0" {
                if let Some(avg) = caps.get(6).and_then(|m| m.as_str().parse().ok()) {
                    result.latency_avg_ms = avg;
                }
            }
        }

        if let Some(secs) = capture_f64(cached(&DURATION, r"in\s+(\d+)\s+sec\."), block, 1) {
            result.total_time_secs = secs;
        }
    }

    // Interval percentiles averaged over the run, worst max_rt kept
    let mut parser = TpccParser::default();
    let samples: Vec<Sample> = output.lines().filter_map(|l| parser.parse_line(l)).collect();
    result.latency_p95_ms = mean_reported(samples.iter().map(|s| s.latency_p95_ms));
    result.latency_p99_ms = mean_reported(samples.iter().map(|s| s.latency_p99_ms));
    result.latency_max_ms = samples
        .iter()
        .filter_map(|s| max_rt(&s.raw_line))
        .fold(0.0, f64::max);

    debug!(tpmc, transactions = result.total_transactions, "parsed tpcc-mysql summary");
    Ok(result)
}

fn max_rt(line: &str) -> Option<f64> {
    static MAX_RT: OnceLock<Regex> = OnceLock::new();
    capture_f64(cached(&MAX_RT, r"max_rt:\s*(\d+(?:\.\d+)?)"), line, 1)
}

fn finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Mean over the intervals that reported a value; 0 when none did
fn mean_reported(values: impl Iterator<Item = Option<f64>>) -> f64 {
    let (sum, n) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}
