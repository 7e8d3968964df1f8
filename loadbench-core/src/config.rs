//! Benchmark Configuration
//!
//! The configuration bundle a caller hands to an adapter. It is owned by
//! whoever orchestrates the execution and only ever borrowed by adapters.

use crate::secret::Secret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Error returned when parsing an identifier into one of the enums below
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// What was being parsed ("database type", "tool", "phase")
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

/// Target database engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// MySQL / MariaDB / Percona Server
    MySql,
    /// PostgreSQL
    PostgreSql,
    /// Oracle Database
    Oracle,
    /// Microsoft SQL Server
    SqlServer,
}

impl DatabaseType {
    /// Stable lowercase identifier
    pub fn as_str(self) -> &'static str {
        match self {
            DatabaseType::MySql => "mysql",
            DatabaseType::PostgreSql => "postgresql",
            DatabaseType::Oracle => "oracle",
            DatabaseType::SqlServer => "sqlserver",
        }
    }

    /// Conventional listener port
    pub fn default_port(self) -> u16 {
        match self {
            DatabaseType::MySql => 3306,
            DatabaseType::PostgreSql => 5432,
            DatabaseType::Oracle => 1521,
            DatabaseType::SqlServer => 1433,
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DatabaseType::MySql),
            "postgresql" | "postgres" | "pgsql" => Ok(DatabaseType::PostgreSql),
            "oracle" => Ok(DatabaseType::Oracle),
            "sqlserver" | "mssql" | "mssqls" => Ok(DatabaseType::SqlServer),
            other => Err(UnknownVariant {
                kind: "database type",
                value: other.to_string(),
            }),
        }
    }
}

/// Supported load-testing tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// sysbench (OLTP Lua workloads)
    Sysbench,
    /// HammerDB CLI (TPROC-C / TPROC-H)
    HammerDb,
    /// Swingbench charbench / oewizard
    Swingbench,
    /// tpcc-mysql (`tpcc_load` / `tpcc_start`)
    Tpcc,
}

impl ToolKind {
    /// All tools, in registration order
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Sysbench,
        ToolKind::HammerDb,
        ToolKind::Swingbench,
        ToolKind::Tpcc,
    ];

    /// Registry identifier
    pub fn id(self) -> &'static str {
        match self {
            ToolKind::Sysbench => "sysbench",
            ToolKind::HammerDb => "hammerdb",
            ToolKind::Swingbench => "swingbench",
            ToolKind::Tpcc => "tpcc",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ToolKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sysbench" => Ok(ToolKind::Sysbench),
            "hammerdb" => Ok(ToolKind::HammerDb),
            "swingbench" | "charbench" => Ok(ToolKind::Swingbench),
            "tpcc" | "tpcc-mysql" => Ok(ToolKind::Tpcc),
            other => Err(UnknownVariant {
                kind: "tool",
                value: other.to_string(),
            }),
        }
    }
}

/// Execution phase a command is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Load schema and data
    Prepare,
    /// Timed measurement
    Run,
    /// Drop what prepare created
    Cleanup,
}

impl Phase {
    /// Lowercase phase name, also used as the sysbench command verb
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Prepare => "prepare",
            Phase::Run => "run",
            Phase::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar template parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating-point value
    Float(f64),
    /// Free text
    Text(String),
}

impl ParamValue {
    /// Interpret as a non-negative integer.
    ///
    /// Integral floats and numeric text are accepted.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ParamValue::Int(v) if *v >= 0 => Some(*v as u64),
            ParamValue::Float(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as u64),
            ParamValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Interpret as a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Text(s) => s.trim().parse().ok(),
            ParamValue::Bool(_) => None,
        }
    }

    /// Render for a command-line argument
    pub fn to_arg(&self) -> String {
        match self {
            ParamValue::Bool(b) => if *b { "on" } else { "off" }.to_string(),
            ParamValue::Int(v) => v.to_string(),
            ParamValue::Float(v) => v.to_string(),
            ParamValue::Text(s) => s.clone(),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Connection capability handed in by the connection layer.
///
/// The password is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Profile name, if the connection came from a named profile
    #[serde(default)]
    pub name: Option<String>,
    /// Database engine
    pub database: DatabaseType,
    /// Host name or address
    pub host: String,
    /// Listener port
    pub port: u16,
    /// Login user
    pub user: String,
    /// Login password
    #[serde(skip)]
    pub password: Option<Secret>,
    /// Database (MySQL/PostgreSQL/SQL Server) or service name (Oracle)
    pub database_name: String,
}

impl ConnectionInfo {
    /// Connection with the engine's default port and no password
    pub fn new(
        database: DatabaseType,
        host: impl Into<String>,
        user: impl Into<String>,
        database_name: impl Into<String>,
    ) -> Self {
        Self {
            name: None,
            database,
            host: host.into(),
            port: database.default_port(),
            user: user.into(),
            password: None,
            database_name: database_name.into(),
        }
    }

    /// Set the password
    pub fn with_password(mut self, password: impl Into<Secret>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Override the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Attach a profile name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// The workload template selected for a benchmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Template name, part of the grouping identity
    pub name: String,
    /// Tool-specific script / workload identifier (e.g. `oltp_read_only`)
    #[serde(default)]
    pub workload: Option<String>,
}

impl Template {
    /// Template without an explicit workload identifier
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workload: None,
        }
    }

    /// Set the workload identifier
    pub fn with_workload(mut self, workload: impl Into<String>) -> Self {
        self.workload = Some(workload.into());
        self
    }
}

/// Execution options that are not tool parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Do not run the prepare phase
    #[serde(default)]
    pub skip_prepare: bool,
    /// Do not run the cleanup phase
    #[serde(default)]
    pub skip_cleanup: bool,
    /// Warm-up duration in seconds (0 = none)
    #[serde(default)]
    pub warmup_secs: u64,
    /// Interval between realtime reports, in seconds
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            skip_prepare: false,
            skip_cleanup: false,
            warmup_secs: 0,
            report_interval_secs: default_report_interval(),
        }
    }
}

fn default_report_interval() -> u64 {
    1
}

/// Everything an adapter needs to build and validate commands
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Target connection
    pub connection: ConnectionInfo,
    /// Selected template
    pub template: Template,
    /// Template parameters (name -> scalar)
    pub parameters: BTreeMap<String, ParamValue>,
    /// Execution options
    pub options: ExecutionOptions,
    /// Directory the tool runs in
    pub working_dir: PathBuf,
}

impl BenchmarkConfig {
    /// Configuration with no parameters, default options and the current directory
    pub fn new(connection: ConnectionInfo, template: Template) -> Self {
        Self {
            connection,
            template,
            parameters: BTreeMap::new(),
            options: ExecutionOptions::default(),
            working_dir: PathBuf::from("."),
        }
    }

    /// Set a parameter (builder style)
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Replace the execution options
    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Look up a parameter
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    /// Whether a parameter is present
    pub fn has_param(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_type_parsing() {
        assert_eq!("MySQL".parse::<DatabaseType>().unwrap(), DatabaseType::MySql);
        assert_eq!("pgsql".parse::<DatabaseType>().unwrap(), DatabaseType::PostgreSql);
        assert_eq!("mssql".parse::<DatabaseType>().unwrap(), DatabaseType::SqlServer);
        assert!("db2".parse::<DatabaseType>().is_err());
    }

    #[test]
    fn test_tool_ids_round_trip() {
        for tool in ToolKind::ALL {
            assert_eq!(tool.id().parse::<ToolKind>().unwrap(), tool);
        }
    }

    #[test]
    fn test_param_value_conversions() {
        assert_eq!(ParamValue::Int(8).as_u64(), Some(8));
        assert_eq!(ParamValue::Int(-1).as_u64(), None);
        assert_eq!(ParamValue::Float(60.0).as_u64(), Some(60));
        assert_eq!(ParamValue::Float(1.5).as_u64(), None);
        assert_eq!(ParamValue::Text(" 16 ".into()).as_u64(), Some(16));
        assert_eq!(ParamValue::Bool(true).to_arg(), "on");
    }

    #[test]
    fn test_untagged_params_deserialize() {
        let params: BTreeMap<String, ParamValue> =
            serde_json::from_str(r#"{"threads": 8, "ratio": 0.5, "skip": true, "mode": "fast"}"#)
                .unwrap();
        assert_eq!(params["threads"], ParamValue::Int(8));
        assert_eq!(params["ratio"], ParamValue::Float(0.5));
        assert_eq!(params["skip"], ParamValue::Bool(true));
        assert_eq!(params["mode"], ParamValue::Text("fast".into()));
    }

    #[test]
    fn test_password_not_serialized() {
        let conn = ConnectionInfo::new(DatabaseType::MySql, "db1", "root", "sbtest")
            .with_password("topsecret");
        let json = serde_json::to_string(&conn).unwrap();
        assert!(!json.contains("topsecret"));
        assert!(!format!("{:?}", conn).contains("topsecret"));
    }
}
