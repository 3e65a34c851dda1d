//! Evenly spaced sampling of a strain range.

use crate::error::AppError;

/// Generate `steps` evenly spaced points from `start` towards `end`.
///
/// With `endpoint = true` the last point is exactly `end`; otherwise the range
/// is half-open and `end` itself is not produced, so consecutive segments can
/// be concatenated without repeating a strain.
pub fn lin_space(start: f64, end: f64, steps: usize, endpoint: bool) -> Result<Vec<f64>, AppError> {
    if !(start.is_finite() && end.is_finite() && end > start) {
        return Err(AppError::InvalidParameterRange(format!(
            "Invalid sampling range: start={start}, end={end} (must be finite with end>start)."
        )));
    }
    if steps < 2 {
        return Err(AppError::InvalidInput("Sampling steps must be >= 2.".to_string()));
    }

    let divisions = if endpoint { steps - 1 } else { steps };
    let step = (end - start) / divisions as f64;

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push(start + step * i as f64);
    }
    if endpoint {
        out[steps - 1] = end;
    }
    Ok(out)
}
