//! Configuration loading from loadbench.toml
//!
//! loadbench configuration can be specified in a `loadbench.toml` file in the project root.
//! The configuration is discovered by walking up from the current directory.

use crate::profiles::{ConnectionProfile, ConnectionProfiles};
use anyhow::Context;
use loadbench_adapters::{DEFAULT_QUEUE_CAPACITY, StreamCollector};
use loadbench_analysis::{
    AnalysisPolicy, DEFAULT_ASSUMED_QUERIES_PER_TX, DEFAULT_LATENCY_TOLERANCE_MS,
    DEFAULT_QPS_TOLERANCE_PCT, SanityPolicy, ScalingPolicy,
};
use loadbench_stats::DEFAULT_CV_THRESHOLD_PCT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// File name looked up by [`LoadbenchConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "loadbench.toml";

/// loadbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoadbenchConfig {
    /// Realtime stream configuration
    #[serde(default)]
    pub stream: StreamConfig,
    /// Analysis thresholds
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Child process limits
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Log filter
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Named connection profiles
    #[serde(default)]
    pub connections: Vec<ConnectionProfile>,
}

/// Realtime stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Capacity of the bounded sample queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

/// Analysis thresholds.
///
/// Knee detection always uses the fixed [`ScalingPolicy`] defaults, so its
/// thresholds are rejected here as unknown keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Allowed QPS deviation from TPS × queries/tx, in percent
    #[serde(default = "default_qps_tolerance_pct")]
    pub qps_tolerance_pct: f64,
    /// Slack for the latency ordering check, in ms
    #[serde(default = "default_latency_tolerance_ms")]
    pub latency_tolerance_ms: f64,
    /// TPS coefficient of variation (percent) above which a group is unstable
    #[serde(default = "default_cv_threshold_pct")]
    pub cv_threshold_pct: f64,
    /// Queries per transaction assumed when a run has no query counts
    #[serde(default = "default_assumed_queries_per_tx")]
    pub assumed_queries_per_tx: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            qps_tolerance_pct: default_qps_tolerance_pct(),
            latency_tolerance_ms: default_latency_tolerance_ms(),
            cv_threshold_pct: default_cv_threshold_pct(),
            assumed_queries_per_tx: default_assumed_queries_per_tx(),
        }
    }
}

fn default_qps_tolerance_pct() -> f64 {
    DEFAULT_QPS_TOLERANCE_PCT
}
fn default_latency_tolerance_ms() -> f64 {
    DEFAULT_LATENCY_TOLERANCE_MS
}
fn default_cv_threshold_pct() -> f64 {
    DEFAULT_CV_THRESHOLD_PCT
}
fn default_assumed_queries_per_tx() -> f64 {
    DEFAULT_ASSUMED_QUERIES_PER_TX
}

/// Child process limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Maximum wall time of one phase (e.g., "2h", "90m")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Wait between SIGTERM and SIGKILL (e.g., "5s")
    #[serde(default = "default_termination_grace")]
    pub termination_grace: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            termination_grace: default_termination_grace(),
        }
    }
}

fn default_timeout() -> String {
    "2h".to_string()
}
fn default_termination_grace() -> String {
    "5s".to_string()
}

/// Log filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "loadbench=info".to_string()
}

impl LoadbenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parse and validate a TOML document
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Find `loadbench.toml` walking up from `start`
    pub fn find_file(start: &Path) -> Option<PathBuf> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        let path = Self::find_file(&dir)?;
        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable configuration");
                None
            }
        }
    }

    /// Reject values that would fail later
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.stream.queue_capacity == 0 {
            anyhow::bail!("stream.queue_capacity must be at least 1");
        }
        self.timeout()?;
        self.termination_grace()?;
        self.connection_profiles()?;
        Ok(())
    }

    /// Phase timeout
    pub fn timeout(&self) -> anyhow::Result<Duration> {
        Self::parse_duration(&self.execution.timeout).context("execution.timeout")
    }

    /// Wait between SIGTERM and SIGKILL
    pub fn termination_grace(&self) -> anyhow::Result<Duration> {
        Self::parse_duration(&self.execution.termination_grace)
            .context("execution.termination_grace")
    }

    /// Analysis section as policy values
    pub fn analysis_policy(&self) -> AnalysisPolicy {
        let a = &self.analysis;
        AnalysisPolicy {
            scaling: ScalingPolicy::default(),
            sanity: SanityPolicy {
                qps_tolerance_pct: a.qps_tolerance_pct,
                latency_tolerance_ms: a.latency_tolerance_ms,
            },
            cv_threshold_pct: a.cv_threshold_pct,
            assumed_queries_per_tx: a.assumed_queries_per_tx,
        }
    }

    /// Collector sized by `stream.queue_capacity`
    pub fn stream_collector(&self) -> StreamCollector {
        StreamCollector::new(self.stream.queue_capacity)
    }

    /// Profile store built from `[[connections]]`
    pub fn connection_profiles(&self) -> anyhow::Result<ConnectionProfiles> {
        Ok(ConnectionProfiles::new(self.connections.clone())?)
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# loadbench configuration

[stream]
# Capacity of the realtime sample queue
queue_capacity = 256

[analysis]
# Sanity: allowed QPS deviation from TPS x queries/tx (percent)
qps_tolerance_pct = 5.0
# Sanity: slack for min <= avg <= p95 <= p99 <= max (ms)
latency_tolerance_ms = 0.01
# Groups with a TPS coefficient of variation above this are unstable
cv_threshold_pct = 10.0
# Simplified reports: queries per transaction when a run has no query counts
assumed_queries_per_tx = 20.0

[execution]
# Maximum wall time of one phase
timeout = "2h"
# Wait between SIGTERM and SIGKILL
termination_grace = "5s"

[logging]
# RUST_LOG overrides this
filter = "loadbench=info"

# [[connections]]
# name = "local-mysql"
# database = "mysql"
# host = "127.0.0.1"
# port = 3306
# user = "sbtest"
# database_name = "sbtest"
# password_env = "LOADBENCH_LOCAL_PASSWORD"
# default = true
"#
        .to_string()
    }

    /// Parse duration string (e.g., "500ms", "5s", "2m", "2h")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Invalid duration: {}", s));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_nanos((value * multiplier as f64) as u64))
    }
}
