//! Progress normalization.
//!
//! Jobs report progress in two shapes: a flat iteration value for
//! single-step jobs, or a step index plus an iteration value within that
//! step for multi-step jobs. [`normalize`] folds both into one percentage.

use crate::job::RawProgress;

/// Map a raw progress payload to a percentage.
///
/// Returns `None` when the payload is missing or indefinite; callers must
/// treat that as "unknown", not as zero. The result is not clamped to
/// `[0, 100]`: malformed server data that overshoots is passed through.
pub fn normalize(raw: Option<&RawProgress>) -> Option<f64> {
    let raw = raw?;
    if raw.is_indefinite() {
        return None;
    }

    let iter_val = raw.iter_val.unwrap_or(0.0);

    match raw.num_steps {
        Some(num_steps) if num_steps >= 2 => {
            let num_steps = num_steps as f64;
            let step_pct = raw.step_index.unwrap_or(0) as f64 / num_steps * 100.0;
            let iter_pct = iter_val / num_steps * 100.0;
            Some(step_pct + iter_pct)
        }
        _ => Some(iter_val * 100.0),
    }
}
