//! Realtime Telemetry Sample

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point-in-time telemetry reading parsed from a tool's output line.
///
/// Every metric is optional: tools report different subsets, and a line may
/// omit fields the tool usually prints. Samples are kept in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// When the line was read
    pub timestamp: DateTime<Utc>,
    /// Seconds since start as reported by the tool itself
    pub elapsed_secs: Option<f64>,
    /// Transactions per second
    pub tps: Option<f64>,
    /// Queries per second
    pub qps: Option<f64>,
    /// Average latency in milliseconds
    pub latency_avg_ms: Option<f64>,
    /// 95th percentile latency in milliseconds
    pub latency_p95_ms: Option<f64>,
    /// 99th percentile latency in milliseconds
    pub latency_p99_ms: Option<f64>,
    /// Errors per second
    pub error_rate: Option<f64>,
    /// Threads / virtual users active when the line was printed
    pub active_threads: Option<u32>,
    /// The original output line
    pub raw_line: String,
}

impl Sample {
    /// Empty sample for `raw_line`, stamped with the current time
    pub fn from_line(raw_line: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            elapsed_secs: None,
            tps: None,
            qps: None,
            latency_avg_ms: None,
            latency_p95_ms: None,
            latency_p99_ms: None,
            error_rate: None,
            active_threads: None,
            raw_line: raw_line.into(),
        }
    }

    /// Whether any metric was captured
    pub fn has_metrics(&self) -> bool {
        self.tps.is_some()
            || self.qps.is_some()
            || self.latency_avg_ms.is_some()
            || self.latency_p95_ms.is_some()
            || self.latency_p99_ms.is_some()
            || self.error_rate.is_some()
            || self.active_threads.is_some()
    }
}
