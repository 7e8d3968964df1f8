//! Order Statistics
//!
//! Rank-based statistics over the per-run values of one metric. Inputs are
//! a handful of runs per configuration, so each call ranks a private copy.

/// `values` in ascending order under `f64::total_cmp`
fn ranked(values: &[f64]) -> Vec<f64> {
    let mut ranked = values.to_vec();
    ranked.sort_by(f64::total_cmp);
    ranked
}

/// Value at `fraction` (0..=1) of an ascending slice, weighted between the
/// two neighbouring ranks
fn interpolate(ranked: &[f64], fraction: f64) -> f64 {
    match ranked {
        [] => 0.0,
        [only] => *only,
        _ => {
            let position = fraction.clamp(0.0, 1.0) * (ranked.len() - 1) as f64;
            let below = position.floor() as usize;
            let above = position.ceil() as usize;
            let weight = position - below as f64;
            ranked[below] * (1.0 - weight) + ranked[above] * weight
        }
    }
}

/// Percentile (0-100) of `values`; 0 for empty input
pub fn compute_percentile(values: &[f64], percentile: f64) -> f64 {
    interpolate(&ranked(values), percentile / 100.0)
}

/// Middle value, or the mean of the two middle values for an even count
pub fn median(values: &[f64]) -> f64 {
    let ranked = ranked(values);
    let mid = ranked.len() / 2;
    match ranked.len() {
        0 => 0.0,
        n if n % 2 == 1 => ranked[mid],
        _ => (ranked[mid - 1] + ranked[mid]) / 2.0,
    }
}
