//! Kepler's equation in equinoctial form

use crate::error::PropagationError;

pub const MAX_ITERATIONS: u32 = 10;
pub const TOLERANCE: f64 = 1.0e-12;
/// Largest Newton correction allowed per iteration, rad
const MAX_STEP: f64 = 0.95;

/// Solve `u = E - axn·sin E + ayn·cos E` for `E` (eccentric longitude minus
/// node) and return `(sin E, cos E)`.
pub fn solve(u: f64, axnl: f64, aynl: f64) -> Result<(f64, f64), PropagationError> {
    let mut eo1 = u;
    let mut step = f64::INFINITY;

    for _ in 0..MAX_ITERATIONS {
        let sineo1 = eo1.sin();
        let coseo1 = eo1.cos();
        step = (u - aynl * coseo1 + axnl * sineo1 - eo1) / (1.0 - coseo1 * axnl - sineo1 * aynl);
        step = step.clamp(-MAX_STEP, MAX_STEP);
        eo1 += step;
        if step.abs() < TOLERANCE {
            return Ok((eo1.sin(), eo1.cos()));
        }
    }

    Err(PropagationError::KeplerNonConvergence {
        iterations: MAX_ITERATIONS,
        residual: step.abs(),
    })
}
