//! Regex helpers shared by the per-tool grammars

use regex::Regex;
use std::sync::OnceLock;

/// Compile `pattern` once into `cell`.
///
/// Only called with literal patterns that are covered by tests.
pub(crate) fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    // Safety: every call site passes a literal regex exercised by the unit tests
    cell.get_or_init(|| Regex::new(pattern).unwrap())
}

/// Capture group `group` of the first match, parsed as f64
pub(crate) fn capture_f64(re: &Regex, text: &str, group: usize) -> Option<f64> {
    re.captures(text)
        .and_then(|c| c.get(group))
        .and_then(|m| m.as_str().parse().ok())
}

/// Capture group `group` of the first match, parsed as u64
pub(crate) fn capture_u64(re: &Regex, text: &str, group: usize) -> Option<u64> {
    re.captures(text)
        .and_then(|c| c.get(group))
        .and_then(|m| m.as_str().parse().ok())
}

/// Indented lines following the line `header`, up to the first blank or
/// unindented line
pub(crate) fn section<'a>(text: &'a str, header: &str) -> Option<&'a str> {
    let mut offset = 0;
    let mut body_start = None;
    for line in text.split_inclusive('\n') {
        let line_end = offset + line.len();
        match body_start {
            None => {
                if line.trim() == header {
                    body_start = Some(line_end);
                }
            }
            Some(start) => {
                let indented = line.starts_with([' ', '\t']) && !line.trim().is_empty();
                if !indented {
                    return Some(&text[start..offset]);
                }
            }
        }
        offset = line_end;
    }
    body_start.map(|start| &text[start..])
}

/// `hh:mm:ss` (or `mm:ss`) as seconds
pub(crate) fn clock_to_secs(clock: &str) -> Option<f64> {
    let mut secs = 0.0;
    for part in clock.trim().split(':') {
        secs = secs * 60.0 + part.parse::<f64>().ok()?;
    }
    Some(secs)
}

/// Seconds as `hh:mm:ss`
pub(crate) fn secs_to_clock(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
