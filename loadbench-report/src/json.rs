//! JSON Output

use serde::Serialize;

/// Pretty-printed JSON for any report value
pub fn generate_json_report<R: Serialize>(report: &R) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
