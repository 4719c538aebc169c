//! Normalization Utilities
//!
//! Converts raw heuristic scores to displayable confidences and computes
//! averages with an explicit empty-set policy.

/// Linear scale: raw score / ceiling, clamped into [floor, cap]
///
/// The floor and cap keep the UI from ever showing 0% or 100%.
pub fn normalize_confidence(raw: f64, ceiling: f64, floor: f64, cap: f64) -> f64 {
    let scaled = if ceiling > 0.0 && raw.is_finite() {
        raw / ceiling
    } else {
        0.0
    };
    scaled.clamp(floor, cap)
}

/// Round to a fixed number of decimals (confidence is reported to 2)
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Mean of a sum over `count` items; an empty set divides by 1
///
/// Returns `sum` unchanged for `count == 0`, which is 0.0 for every caller
/// that sums over an empty slice. Never NaN or infinite for finite input.
pub fn mean_or_zero(sum: f64, count: usize) -> f64 {
    let denominator = count.max(1) as f64;
    sum / denominator
}
