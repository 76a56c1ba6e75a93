//! Chebyshev series evaluation for ephemeris interpolation
//!
//! JPL kernels store each coordinate as a Chebyshev expansion over a fixed
//! time interval; evaluation uses the Clenshaw recurrence.

use crate::jplephem::errors::{JplephemError, Result};

/// Evaluate `sum(c[k] * T_k(x))` for `x` in [-1, 1]
///
/// Coefficients are ordered from lowest to highest degree.
pub fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    let mut b1 = 0.0;
    let mut b2 = 0.0;
    for &c in coefficients.iter().skip(1).rev() {
        let b0 = 2.0 * x * b1 - b2 + c;
        b2 = b1;
        b1 = b0;
    }
    match coefficients.first() {
        Some(&c0) => x * b1 - b2 + c0,
        None => 0.0,
    }
}

/// Map a time onto the [-1, 1] domain of a record with the given midpoint
/// and half-length
pub fn normalize_time(time: f64, midpoint: f64, radius: f64) -> Result<f64> {
    if radius <= 0.0 {
        return Err(JplephemError::InvalidFormat(format!(
            "Chebyshev record radius must be positive, got {radius}"
        )));
    }
    // Allow a hair of slack at record boundaries
    Ok(((time - midpoint) / radius).clamp(-1.0, 1.0))
}
