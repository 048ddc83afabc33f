//! Small numeric helpers shared across modules.

use std::cmp::Ordering;

/// Empirical quantile by order statistic.
///
/// Returns the value at sorted position `floor(n * q)`, clamped to the last
/// element, or `None` for an empty slice.
pub fn empirical_quantile(values: &[f64], q: f64) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let idx = ((n as f64 * q.clamp(0.0, 1.0)) as usize).min(n - 1);
    Some(sorted[idx])
}
