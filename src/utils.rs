/// Strip the query string from a request path.
pub fn normalize_path(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

/// Clamp a score into the unit interval.
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
