//! HammerDB Adapter
//!
//! Runs the TPROC-C workload through `hammerdbcli auto <script>.tcl`. Each
//! phase gets its own generated Tcl script; the database password is read by
//! the script from `$::env(LOADBENCH_DB_PASSWORD)` and never written to disk.
//!
//! Realtime telemetry comes from the transaction counter:
//!
//! ```text
//! 132426 MySQL tpm @ Thu Sep 14 10:01:00 BST 2023
//! ```
//!
//! and the summary from the virtual user that reports the test result:
//!
//! ```text
//! Vuser 1:TEST RESULT : System achieved 23234 NOPM from 54112 MySQL TPM
//! ```

use crate::adapter::{BenchmarkAdapter, TelemetryParser};
use crate::error::{AdapterError, ValidationError};
use crate::text::{cached, capture_f64};
use crate::validate::{self, THREADS, TIME};
use loadbench_core::{
    BenchmarkConfig, Command, DatabaseType, FinalResult, Phase, Sample, ToolKind,
};
use regex::Regex;
use std::fmt::Write as _;
use std::sync::OnceLock;
use tracing::debug;

const SUPPORTED: &[DatabaseType] = &[
    DatabaseType::MySql,
    DatabaseType::PostgreSql,
    DatabaseType::Oracle,
    DatabaseType::SqlServer,
];

/// Environment variable the generated scripts read the password from
pub const PASSWORD_ENV: &str = "LOADBENCH_DB_PASSWORD";

/// The only workload the adapter drives
pub const WORKLOAD: &str = "tpcc";

const WAREHOUSES: &str = "warehouses";

const RESERVED: &[&str] = &[THREADS, TIME, WAREHOUSES, "rampup", "build_vu"];

/// `diset` key names for one database backend
#[derive(Debug)]
struct Dialect {
    dbset: &'static str,
    host: &'static str,
    port: &'static str,
    /// Section holding the login user/password
    login_section: &'static str,
    user: &'static str,
    pass: &'static str,
    dbase: &'static str,
    count_ware: &'static str,
    num_vu: &'static str,
    driver: &'static str,
    rampup: &'static str,
    duration: &'static str,
    timeprofile: &'static str,
}

const MYSQL: Dialect = Dialect {
    dbset: "mysql",
    host: "mysql_host",
    port: "mysql_port",
    login_section: "tpcc",
    user: "mysql_user",
    pass: "mysql_pass",
    dbase: "mysql_dbase",
    count_ware: "mysql_count_ware",
    num_vu: "mysql_num_vu",
    driver: "mysql_driver",
    rampup: "mysql_rampup",
    duration: "mysql_duration",
    timeprofile: "mysql_timeprofile",
};

const POSTGRES: Dialect = Dialect {
    dbset: "pg",
    host: "pg_host",
    port: "pg_port",
    login_section: "tpcc",
    user: "pg_user",
    pass: "pg_pass",
    dbase: "pg_dbase",
    count_ware: "pg_count_ware",
    num_vu: "pg_num_vu",
    driver: "pg_driver",
    rampup: "pg_rampup",
    duration: "pg_duration",
    timeprofile: "pg_timeprofile",
};

const ORACLE: Dialect = Dialect {
    dbset: "ora",
    host: "instance",
    port: "",
    login_section: "tpcc",
    user: "tpcc_user",
    pass: "tpcc_pass",
    dbase: "",
    count_ware: "count_ware",
    num_vu: "num_vu",
    driver: "ora_driver",
    rampup: "rampup",
    duration: "duration",
    timeprofile: "ora_timeprofile",
};

const SQLSERVER: Dialect = Dialect {
    dbset: "mssqls",
    host: "mssqls_server",
    port: "mssqls_port",
    login_section: "connection",
    user: "mssqls_uid",
    pass: "mssqls_pass",
    dbase: "mssqls_dbase",
    count_ware: "mssqls_count_ware",
    num_vu: "mssqls_num_vu",
    driver: "mssqls_driver",
    rampup: "mssqls_rampup",
    duration: "mssqls_duration",
    timeprofile: "mssqls_timeprofile",
};

fn dialect(database: DatabaseType) -> &'static Dialect {
    match database {
        DatabaseType::MySql => &MYSQL,
        DatabaseType::PostgreSql => &POSTGRES,
        DatabaseType::Oracle => &ORACLE,
        DatabaseType::SqlServer => &SQLSERVER,
    }
}

/// HammerDB adapter
#[derive(Debug, Default, Clone, Copy)]
pub struct HammerDbAdapter;

impl HammerDbAdapter {
    /// Name of the generated script for `phase`
    pub fn script_name(phase: Phase) -> String {
        format!("loadbench_{}.tcl", phase.as_str())
    }

    fn script(&self, phase: Phase, config: &BenchmarkConfig) -> Result<String, AdapterError> {
        let conn = &config.connection;
        let d = dialect(conn.database);
        let mut tcl = String::new();

        let mut diset = |section: &str, key: &str, value: &str| {
            // Writing into a String cannot fail
            let _ = writeln!(tcl, "diset {} {} {}", section, key, value);
        };

        match conn.database {
            DatabaseType::Oracle => {
                let instance = format!("{}:{}/{}", conn.host, conn.port, conn.database_name);
                diset("connection", d.host, &tcl_word("host", &instance)?);
                diset("connection", "system_user", &tcl_word("user", &conn.user)?);
                diset("connection", "system_password", &format!("$::env({})", PASSWORD_ENV));
            }
            _ => {
                diset("connection", d.host, &tcl_word("host", &conn.host)?);
                diset("connection", d.port, &conn.port.to_string());
                diset("tpcc", d.dbase, &tcl_word("database_name", &conn.database_name)?);
            }
        }
        if conn.database == DatabaseType::SqlServer {
            diset("connection", "mssqls_authentication", "sql");
        }
        diset(d.login_section, d.user, &tcl_word("user", &conn.user)?);
        diset(d.login_section, d.pass, &format!("$::env({})", PASSWORD_ENV));
        if conn.database == DatabaseType::PostgreSql {
            diset("tpcc", "pg_superuser", &tcl_word("user", &conn.user)?);
            diset("tpcc", "pg_superuserpass", &format!("$::env({})", PASSWORD_ENV));
        }

        if phase != Phase::Cleanup {
            let warehouses = validate::require_u64(config, phase, WAREHOUSES)?;
            diset("tpcc", d.count_ware, &warehouses.to_string());
        }

        let mut vusers = None;
        match phase {
            Phase::Prepare => {
                let build_vu = match validate::optional_u64(config, "build_vu")? {
                    Some(n) => n,
                    None => validate::u64_or(config, THREADS, 1)?,
                };
                diset("tpcc", d.num_vu, &build_vu.max(1).to_string());
            }
            Phase::Run => {
                let bounds = validate::run_bounds(config)?;
                let rampup_secs = validate::u64_or(config, "rampup", config.options.warmup_secs)?;
                diset("tpcc", d.driver, "timed");
                diset(
                    "tpcc",
                    d.rampup,
                    &validate::minutes_ceil(rampup_secs, 0).to_string(),
                );
                diset(
                    "tpcc",
                    d.duration,
                    &validate::minutes_ceil(bounds.time_secs, 1).to_string(),
                );
                diset("tpcc", d.timeprofile, "true");
                vusers = Some(bounds.threads);
            }
            Phase::Cleanup => {}
        }

        for (name, value) in validate::passthrough(config, RESERVED) {
            diset("tpcc", name.as_str(), &tcl_word(name, &value.to_arg())?);
        }

        let mut script = String::new();
        let _ = writeln!(script, "puts \"loadbench: {} phase\"", phase);
        let _ = writeln!(script, "dbset db {}", d.dbset);
        let _ = writeln!(script, "dbset bm TPC-C");
        script.push_str(&tcl);

        match phase {
            Phase::Prepare => script.push_str("buildschema\n"),
            Phase::Cleanup => script.push_str("deleteschema\n"),
            Phase::Run => {
                let vu = vusers.unwrap_or(1);
                let _ = writeln!(script, "loadscript");
                let _ = writeln!(script, "vuset vu {}", vu);
                let _ = writeln!(script, "vuset logtotemp 1");
                let _ = writeln!(script, "vucreate");
                let _ = writeln!(script, "tcstart");
                let _ = writeln!(script, "tcstatus");
                let _ = writeln!(script, "set jobid [ vurun ]");
                let _ = writeln!(script, "tcstop");
                let _ = writeln!(script, "vudestroy");
            }
        }
        Ok(script)
    }
}

impl BenchmarkAdapter for HammerDbAdapter {
    fn tool(&self) -> ToolKind {
        ToolKind::HammerDb
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

        match &config.template.workload {
            Some(workload) if !workload.eq_ignore_ascii_case(WORKLOAD) => {
                return Err(ValidationError::InvalidParameter {
                    name: "workload".to_string(),
                    reason: format!("unsupported HammerDB workload '{}', expected tpcc", workload),
                }
                .into());
            }
            _ => {}
        }
        validate::optional_u64(config, "rampup")?;
        validate::optional_u64(config, "build_vu")?;

        let conn = &config.connection;
        tcl_word("host", &conn.host)?;
        tcl_word("user", &conn.user)?;
        tcl_word("database_name", &conn.database_name)?;
        for (name, value) in validate::passthrough(config, RESERVED) {
            tcl_word(name, &value.to_arg())?;
        }
        Ok(())
    }

    fn build_command(
        &self,
        phase: Phase,
        config: &BenchmarkConfig,
    ) -> Result<Command, AdapterError> {
        self.validate_config(phase, config)?;

        let script_name = Self::script_name(phase);
        let script = self.script(phase, config)?;

        let mut cmd = Command::new("hammerdbcli", &config.working_dir);
        cmd.arg("auto").arg(script_name.clone()).file(script_name, script);
        if let Some(password) = &config.connection.password {
            cmd.secret_env(PASSWORD_ENV, password.clone());
        }
        Ok(cmd)
    }

    fn telemetry_parser(&self) -> Box<dyn TelemetryParser> {
        Box::new(HammerDbParser)
    }

    fn extract_final_result(&self, output: &str) -> Result<FinalResult, AdapterError> {
        extract(output)
    }
}

/// Brace-quote a Tcl word unless it is plainly safe.
///
/// Braces and backslashes cannot be represented inside a braced word.
fn tcl_word(name: &str, value: &str) -> Result<String, ValidationError> {
    if value.contains(['{', '}', '\\']) {
        return Err(ValidationError::InvalidParameter {
            name: name.to_string(),
            reason: format!("'{}' contains a brace or backslash", value),
        });
    }
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@".contains(c));
    if safe {
        Ok(value.to_string())
    } else {
        Ok(format!("{{{}}}", value))
    }
}

/// Parses transaction counter lines
#[derive(Debug, Default)]
pub struct HammerDbParser;

impl TelemetryParser for HammerDbParser {
    fn parse_line(&mut self, line: &str) -> Option<Sample> {
        static TPM: OnceLock<Regex> = OnceLock::new();
        let re = cached(
            &TPM,
            r"(?:^|:)\s*(\d+)\s+(?:MySQL|MariaDB|PostgreSQL|Oracle|SQL Server|MSSQLServer|Db2)\s+tpm\b",
        );
        let tpm = capture_f64(re, line, 1)?;

        let mut sample = Sample::from_line(line);
        sample.tps = Some(tpm / 60.0);
        Some(sample)
    }
}

fn extract(output: &str) -> Result<FinalResult, AdapterError> {
    static RESULT: OnceLock<Regex> = OnceLock::new();
    static ELAPSED: OnceLock<Regex> = OnceLock::new();

    let re = cached(
        &RESULT,
        r"TEST RESULT\s*:\s*System achieved\s+(\d+)\s+NOPM from\s+(\d+)\s+.+?\s+TPM",
    );
    let Some(caps) = re.captures(output) else {
        return Err(AdapterError::UnparsableOutput {
            tool: ToolKind::HammerDb,
            reason: "no 'TEST RESULT' line".to_string(),
        });
    };
    let nopm: f64 = caps[1].parse().unwrap_or(0.0);
    let tpm: f64 = caps[2].parse().unwrap_or(0.0);

    let mut result = FinalResult::empty(ToolKind::HammerDb);
    result.tps = tpm / 60.0;
    result.tool_metrics.insert("nopm".to_string(), nopm);
    result.tool_metrics.insert("tpm".to_string(), tpm);

    if let Some(ms) = capture_f64(
        cached(&ELAPSED, r"MEDIAN ELAPSED TIME\s*:\s*(\d+(?:\.\d+)?)ms"),
        output,
        1,
    ) {
        result.total_time_secs = ms / 1000.0;
    }

    if let Some(profile) = neword_profile(output) {
        result.latency_min_ms = profile.min;
        result.latency_avg_ms = profile.avg;
        result.latency_max_ms = profile.max;
        result.latency_sum_ms = profile.total;
        result.latency_p95_ms = profile.p95;
        result.latency_p99_ms = profile.p99;
        result
            .tool_metrics
            .insert("neword_calls".to_string(), profile.calls);
    }

    debug!(nopm, tpm, "parsed HammerDB summary");
    Ok(result)
}

#[derive(Debug, Default, PartialEq)]
struct ProcProfile {
    calls: f64,
    min: f64,
    avg: f64,
    max: f64,
    total: f64,
    p99: f64,
    p95: f64,
}

/// Time profile of the NEWORD stored procedure, if the run printed one
fn neword_profile(output: &str) -> Option<ProcProfile> {
    static FIELD: OnceLock<Regex> = OnceLock::new();
    let field = cached(
        &FIELD,
        r"\b(CALLS|MIN|AVG|MAX|TOTAL|P99|P95):\s*(\d+(?:\.\d+)?)",
    );

    let start = output.find(">>>>> PROC: NEWORD")?;
    let block = &output[start..];
    let block = block
        .get(1..)
        .and_then(|rest| rest.find(">>>>>").map(|end| &block[..end + 1]))
        .unwrap_or(block);

    let mut profile = ProcProfile::default();
    let mut seen = false;
    for caps in field.captures_iter(block) {
        let value: f64 = caps[2].parse().unwrap_or(0.0);
        seen = true;
        match &caps[1] {
            "CALLS" => profile.calls = value,
            "MIN" => profile.min = value,
            "AVG" => profile.avg = value,
            "MAX" => profile.max = value,
            "TOTAL" => profile.total = value,
            "P99" => profile.p99 = value,
            "P95" => profile.p95 = value,
            _ => {}
        }
    }
    seen.then_some(profile)
}
