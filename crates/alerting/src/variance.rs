//! Variance and display helpers
//!
//! All helpers are NaN-safe: non-finite inputs produce `None` or `"N/A"`.

/// Display value for anything that cannot be shown as a number
pub const NOT_AVAILABLE: &str = "N/A";

/// Percent deviation of `current` from `expected`
pub fn variance_percent(current: Option<f64>, expected: Option<f64>) -> Option<f64> {
    let (current, expected) = (current?, expected?);
    if !current.is_finite() || !expected.is_finite() || expected == 0.0 {
        return None;
    }
    let variance = (current - expected) / expected.abs() * 100.0;
    variance.is_finite().then_some(variance)
}

/// Two-decimal value or "N/A"
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Signed percentage such as "+12.50%", or "N/A"
pub fn format_variance(variance: Option<f64>) -> String {
    match variance {
        Some(v) if v.is_finite() => format!("{:+.2}%", v),
        _ => NOT_AVAILABLE.to_string(),
    }
}
