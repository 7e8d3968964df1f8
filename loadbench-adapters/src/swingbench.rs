//! Swingbench Adapter
//!
//! Oracle only. The Order Entry schema is built and dropped with `oewizard`
//! in command-line mode; the measured run is `charbench`, which prints one
//! status line per second and writes its summary to `results.xml`.
//!
//! ```text
//! Time     Users       TPM      TPS     Errors
//! 10:15:03 [4/4]       1200     21      0
//! ```

use crate::adapter::{BenchmarkAdapter, TelemetryParser};
use crate::error::AdapterError;
use crate::text::{cached, clock_to_secs, secs_to_clock};
use crate::validate::{self, THREADS, TIME};
use loadbench_core::{
    BenchmarkConfig, Command, DatabaseType, FinalResult, Phase, Sample, ToolKind,
};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const SUPPORTED: &[DatabaseType] = &[DatabaseType::Oracle];

/// Summary file charbench writes into its working directory
pub const RESULT_FILE: &str = "results.xml";

/// Environment variable holding the schema owner's password
pub const PASSWORD_ENV: &str = "SWINGBENCH_PASSWORD";

/// Environment variable holding the DBA password used by `oewizard`
pub const DBA_PASSWORD_ENV: &str = "SWINGBENCH_DBA_PASSWORD";

/// charbench configuration used when the template names none
pub const DEFAULT_CONFIG: &str = "configs/SOE_Server_Side_V2.xml";

const DEFAULT_DBA_USER: &str = "system";
const DEFAULT_SCALE: u64 = 1;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Swingbench adapter
#[derive(Debug, Default, Clone, Copy)]
pub struct SwingbenchAdapter;

impl SwingbenchAdapter {
    fn connect_string(config: &BenchmarkConfig) -> String {
        let conn = &config.connection;
        format!("//{}:{}/{}", conn.host, conn.port, conn.database_name)
    }

    fn dba_user(config: &BenchmarkConfig) -> String {
        config
            .param("dba_user")
            .map(|v| v.to_arg())
            .unwrap_or_else(|| DEFAULT_DBA_USER.to_string())
    }
}

impl BenchmarkAdapter for SwingbenchAdapter {
    fn tool(&self) -> ToolKind {
        ToolKind::Swingbench
    }

    fn supported_databases(&self) -> &'static [DatabaseType] {
        SUPPORTED
    }

    fn validate_config(&self, phase: Phase, config: &BenchmarkConfig) -> Result<(), AdapterError> {
        validate::validate_common(self.tool(), SUPPORTED, phase, config, &[])?;
        validate::optional_u64(config, "scale")?;
        validate::optional_u64(config, THREADS)?;
        Ok(())
    }

    fn build_command(
        &self,
        phase: Phase,
        config: &BenchmarkConfig,
    ) -> Result<Command, AdapterError> {
        self.validate_config(phase, config)?;

        let conn = &config.connection;
        let connect = Self::connect_string(config);

        let mut cmd = match phase {
            Phase::Prepare | Phase::Cleanup => {
                let mut cmd = Command::new("oewizard", &config.working_dir);
                cmd.arg("-cl")
                    .arg(if phase == Phase::Prepare { "-create" } else { "-drop" })
                    .args(["-cs", connect.as_str()])
                    .args(["-u", conn.user.as_str()])
                    .args(["-dba", Self::dba_user(config).as_str()]);
                if phase == Phase::Prepare {
                    cmd.args([
                        "-scale".to_string(),
                        validate::u64_or(config, "scale", DEFAULT_SCALE)?.to_string(),
                    ]);
                    if let Some(threads) = validate::optional_u64(config, THREADS)? {
                        cmd.args(["-tc".to_string(), threads.to_string()]);
                    }
                }
                cmd
            }
            Phase::Run => {
                let bounds = validate::run_bounds(config)?;
                let bench_config = config
                    .template
                    .workload
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

                let mut cmd = Command::new("charbench", &config.working_dir);
                cmd.args(["-c", bench_config.as_str()])
                    .args(["-cs", connect.as_str()])
                    .args(["-u", conn.user.as_str()])
                    .args(["-uc".to_string(), bounds.threads.to_string()])
                    .args(["-rt".to_string(), secs_to_clock(bounds.time_secs)])
                    .args(["-v", "users,tpm,tps,errs"])
                    .args(["-r", RESULT_FILE]);
                cmd.result_file = Some(RESULT_FILE.into());
                cmd
            }
        };

        for (name, _) in validate::passthrough(config, &[THREADS, TIME, "scale", "dba_user"]) {
            debug!(parameter = %name, "swingbench ignores parameter");
        }

        if let Some(password) = &conn.password {
            cmd.secret_env(PASSWORD_ENV, password.clone());
            if phase != Phase::Run {
                cmd.secret_env(DBA_PASSWORD_ENV, password.clone());
            }
        }
        Ok(cmd)
    }

    fn telemetry_parser(&self) -> Box<dyn TelemetryParser> {
        Box::new(SwingbenchParser::default())
    }

    fn extract_final_result(&self, output: &str) -> Result<FinalResult, AdapterError> {
        extract(output)
    }
}

/// Parses charbench status lines.
///
/// Elapsed time is measured from the first status line; the error column is
/// cumulative, so the error rate is derived from consecutive lines.
#[derive(Debug, Default)]
pub struct SwingbenchParser {
    first_clock: Option<f64>,
    prev: Option<(f64, f64)>,
}

impl TelemetryParser for SwingbenchParser {
    fn parse_line(&mut self, line: &str) -> Option<Sample> {
        static STATUS: OnceLock<Regex> = OnceLock::new();
        let re = cached(
            &STATUS,
            r"^\s*(\d{1,2}:\d{2}:\d{2})\s+\[(\d+)/(\d+)\]\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)",
        );
        let caps = re.captures(line)?;
        let clock = clock_to_secs(&caps[1])?;
        let errors: f64 = caps[6].parse().ok()?;

        let first = *self.first_clock.get_or_insert(clock);
        let mut elapsed = clock - first;
        if elapsed < 0.0 {
            // Run crossed midnight
            elapsed += SECONDS_PER_DAY;
        }

        let mut sample = Sample::from_line(line);
        sample.elapsed_secs = Some(elapsed);
        sample.active_threads = caps[2].parse().ok();
        sample.tps = caps[5].parse().ok();
        sample.error_rate = match self.prev {
            Some((prev_elapsed, prev_errors)) if elapsed > prev_elapsed => {
                Some(((errors - prev_errors) / (elapsed - prev_elapsed)).max(0.0))
            }
            _ => None,
        };
        self.prev = Some((elapsed, errors));
        Some(sample)
    }
}

/// Text of the first `<tag>...</tag>` element
fn xml_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(xml[start..end].trim())
}

fn xml_f64(xml: &str, tag: &str) -> Option<f64> {
    xml_text(xml, tag).and_then(|v| v.parse().ok())
}

/// Bodies of all `<Result ...>...</Result>` elements
fn result_blocks(xml: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find("<Result ").or_else(|| rest.find("<Result>")) {
        let Some(body_start) = rest[start..].find('>').map(|i| start + i + 1) else {
            break;
        };
        let Some(end) = rest[body_start..].find("</Result>").map(|i| body_start + i) else {
            break;
        };
        blocks.push(&rest[body_start..end]);
        rest = &rest[end + "</Result>".len()..];
    }
    blocks
}

fn extract(output: &str) -> Result<FinalResult, AdapterError> {
    let completed = xml_f64(output, "TotalCompletedTransactions").ok_or_else(|| {
        AdapterError::UnparsableOutput {
            tool: ToolKind::Swingbench,
            reason: "results XML has no TotalCompletedTransactions".to_string(),
        }
    })?;

    let mut result = FinalResult::empty(ToolKind::Swingbench);
    result.total_transactions = completed as u64;
    result.ignored_errors = xml_f64(output, "TotalFailedTransactions").unwrap_or(0.0) as u64;
    result.total_time_secs = xml_text(output, "TotalRunTime")
        .and_then(clock_to_secs)
        .unwrap_or(0.0);

    result.tps = match xml_f64(output, "AverageTransactionsPerSecond") {
        Some(tps) => tps,
        None if result.total_time_secs > 0.0 => completed / result.total_time_secs,
        None => 0.0,
    };
    if let Some(max_tpm) = xml_f64(output, "MaximumTransactionRate") {
        result.tool_metrics.insert("max_tpm".to_string(), max_tpm);
    }

    // Per-transaction latencies: count-weighted mean, extreme min/max, worst p95
    let mut weighted = 0.0;
    let mut count = 0.0;
    let mut min: Option<f64> = None;
    let mut max: f64 = 0.0;
    let mut p95: f64 = 0.0;
    for block in result_blocks(output) {
        let n = xml_f64(block, "TransactionCount").unwrap_or(0.0);
        if let Some(avg) = xml_f64(block, "AverageResponse") {
            weighted += avg * n;
            count += n;
        }
        if let Some(v) = xml_f64(block, "MinimumTransactionTime") {
            min = Some(min.map_or(v, |m| m.min(v)));
        }
        if let Some(v) = xml_f64(block, "MaximumTransactionTime") {
            max = max.max(v);
        }
        if let Some(v) = xml_f64(block, "NinetyFifthPercentile") {
            p95 = p95.max(v);
        }
    }
    if count > 0.0 {
        result.latency_avg_ms = weighted / count;
    }
    result.latency_min_ms = min.unwrap_or(0.0);
    result.latency_max_ms = max;
    result.latency_p95_ms = p95;

    debug!(
        transactions = result.total_transactions,
        tps = result.tps,
        "parsed swingbench results"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadbench_core::{ConnectionInfo, Template};

    const RESULTS: &str = r#"<?xml version = '1.0' encoding = 'UTF-8'?>
<Results xmlns="http://www.dominicgiles.com/swingbench/results">
   <Overview>
      <BenchmarkName>Order Entry (PLSQL) V2</BenchmarkName>
      <TotalRunTime>0:05:00</TotalRunTime>
      <TotalCompletedTransactions>30000</TotalCompletedTransactions>
      <TotalFailedTransactions>12</TotalFailedTransactions>
      <AverageTransactionsPerSecond>100.0</AverageTransactionsPerSecond>
      <MaximumTransactionRate>7200</MaximumTransactionRate>
   </Overview>
   <TransactionResults>
      <Result id="Customer Registration">
         <TransactionCount>10000</TransactionCount>
         <AverageResponse>10.0</AverageResponse>
         <MinimumTransactionTime>2</MinimumTransactionTime>
         <MaximumTransactionTime>90</MaximumTransactionTime>
         <NinetyFifthPercentile>20</NinetyFifthPercentile>
      </Result>
      <Result id="Browse Products">
         <TransactionCount>20000</TransactionCount>
         <AverageResponse>4.0</AverageResponse>
         <MinimumTransactionTime>1</MinimumTransactionTime>
         <MaximumTransactionTime>150</MaximumTransactionTime>
         <NinetyFifthPercentile>12</NinetyFifthPercentile>
      </Result>
   </TransactionResults>
</Results>
"#;

    fn config() -> BenchmarkConfig {
        BenchmarkConfig::new(
            ConnectionInfo::new(DatabaseType::Oracle, "ora1", "soe", "orclpdb").with_password("tiger"),
            Template::named("soe"),
        )
    }

    #[test]
    fn test_parse_status_lines() {
        let mut parser = SwingbenchParser::default();
        assert!(parser.parse_line("Time     Users       TPM      TPS     Errors").is_none());

        let first = parser.parse_line("10:15:02 [0/4]       0        0       0").unwrap();
        assert_eq!(first.elapsed_secs, Some(0.0));
        assert_eq!(first.active_threads, Some(0));
        assert_eq!(first.error_rate, None);

        let second = parser.parse_line("10:15:04 [4/4]       1200     21      4").unwrap();
        assert_eq!(second.elapsed_secs, Some(2.0));
        assert_eq!(second.active_threads, Some(4));
        assert_eq!(second.tps, Some(21.0));
        assert_eq!(second.error_rate, Some(2.0));
    }

    #[test]
    fn test_parser_handles_midnight() {
        let mut parser = SwingbenchParser::default();
        parser.parse_line("23:59:59 [4/4] 100 10 0").unwrap();
        let next = parser.parse_line("00:00:01 [4/4] 100 10 0").unwrap();
        assert_eq!(next.elapsed_secs, Some(2.0));
    }

    #[test]
    fn test_extract_results_xml() {
        let result = SwingbenchAdapter.extract_final_result(RESULTS).unwrap();
        assert_eq!(result.total_transactions, 30_000);
        assert_eq!(result.ignored_errors, 12);
        assert_eq!(result.total_time_secs, 300.0);
        assert_eq!(result.tps, 100.0);
        assert_eq!(result.tool_metrics["max_tpm"], 7200.0);
        assert!((result.latency_avg_ms - 6.0).abs() < 1e-9);
        assert_eq!(result.latency_min_ms, 1.0);
        assert_eq!(result.latency_max_ms, 150.0);
        assert_eq!(result.latency_p95_ms, 20.0);
    }

    #[test]
    fn test_extract_tps_fallback() {
        let xml = "<TotalRunTime>0:01:00</TotalRunTime><TotalCompletedTransactions>600</TotalCompletedTransactions>";
        let result = SwingbenchAdapter.extract_final_result(xml).unwrap();
        assert_eq!(result.tps, 10.0);
    }

    #[test]
    fn test_extract_requires_completed_count() {
        assert!(matches!(
            SwingbenchAdapter.extract_final_result("Connection refused"),
            Err(AdapterError::UnparsableOutput { .. })
        ));
    }

    #[test]
    fn test_build_run_command() {
        let cfg = config().with_param("threads", 16i64).with_param("time", 3723i64);
        let cmd = SwingbenchAdapter.build_run_command(&cfg).unwrap();
        assert_eq!(cmd.program, "charbench");
        assert_eq!(
            cmd.command_line(),
            "charbench -c configs/SOE_Server_Side_V2.xml -cs //ora1:1521/orclpdb -u soe -uc 16 -rt 01:02:03 -v users,tpm,tps,errs -r results.xml"
        );
        assert_eq!(cmd.result_file.as_deref(), Some(std::path::Path::new(RESULT_FILE)));
        assert_eq!(cmd.env_value(PASSWORD_ENV).unwrap().expose(), "tiger");
        assert!(cmd.env_value(DBA_PASSWORD_ENV).is_none());
    }

    #[test]
    fn test_build_wizard_commands() {
        let cfg = config().with_param("scale", 4i64);
        let prepare = SwingbenchAdapter.build_prepare_command(&cfg).unwrap();
        assert_eq!(prepare.program, "oewizard");
        assert!(prepare.args.contains(&"-create".to_string()));
        assert!(prepare.command_line().contains("-scale 4"));
        assert!(prepare.command_line().contains("-dba system"));
        assert!(!prepare.command_line().contains("tiger"));
        assert!(prepare.env_value(DBA_PASSWORD_ENV).is_some());

        let cleanup = SwingbenchAdapter.build_cleanup_command(&cfg).unwrap();
        assert!(cleanup.args.contains(&"-drop".to_string()));
        assert!(!cleanup.args.contains(&"-scale".to_string()));
    }

    #[test]
    fn test_rejects_non_oracle() {
        let mut cfg = config();
        cfg.connection.database = DatabaseType::MySql;
        assert!(matches!(
            SwingbenchAdapter.build_prepare_command(&cfg),
            Err(AdapterError::UnsupportedDatabase { .. })
        ));
    }
}
