//! Piecewise-linear resampling onto a frequency grid.
//!
//! Points left of `xp[0]` take `fp[0]` and points right of the last sample
//! take the last value. A NaN query yields NaN.

use crate::error::InvalidInputError;
use ndarray::Array1;
use num_complex::Complex64;
use std::ops::{Add, Mul, Sub};

fn check_grid(xp: &Array1<f64>, fp_len: usize) -> Result<(), InvalidInputError> {
    if xp.is_empty() {
        return Err(InvalidInputError::shape("xp", 1, 0));
    }
    if fp_len != xp.len() {
        return Err(InvalidInputError::shape("fp", xp.len(), fp_len));
    }
    for i in 0..xp.len() {
        if !xp[i].is_finite() {
            return Err(InvalidInputError::domain(
                "xp",
                i,
                format!("sample points must be finite, got {}", xp[i]),
            ));
        }
        if i > 0 && xp[i] <= xp[i - 1] {
            return Err(InvalidInputError::domain(
                "xp",
                i,
                format!(
                    "sample points must be strictly increasing, {} follows {}",
                    xp[i],
                    xp[i - 1]
                ),
            ));
        }
    }
    Ok(())
}

/// Index `j` with `xp[j] <= x < xp[j + 1]`, for `xp[0] <= x < xp[n - 1]`
fn bracket(xp: &Array1<f64>, x: f64) -> usize {
    let mut lo = 0;
    let mut hi = xp.len() - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if xp[mid] <= x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

fn interp_with<T>(x: &Array1<f64>, xp: &Array1<f64>, fp: &Array1<T>, nan: T) -> Array1<T>
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T>,
{
    let last = xp.len() - 1;
    x.map(|&xi| {
        if xi.is_nan() {
            nan
        } else if xi <= xp[0] {
            fp[0]
        } else if xi >= xp[last] {
            fp[last]
        } else {
            let j = bracket(xp, xi);
            let t = (xi - xp[j]) / (xp[j + 1] - xp[j]);
            fp[j] + (fp[j + 1] - fp[j]) * t
        }
    })
}

/// Linear interpolation of real samples `(xp, fp)` at `x`
pub fn interp(
    x: &Array1<f64>,
    xp: &Array1<f64>,
    fp: &Array1<f64>,
) -> Result<Array1<f64>, InvalidInputError> {
    check_grid(xp, fp.len())?;
    Ok(interp_with(x, xp, fp, f64::NAN))
}

/// Linear interpolation of complex samples, real and imaginary parts
/// independently
pub fn interp_complex(
    x: &Array1<f64>,
    xp: &Array1<f64>,
    fp: &Array1<Complex64>,
) -> Result<Array1<Complex64>, InvalidInputError> {
    check_grid(xp, fp.len())?;
    Ok(interp_with(x, xp, fp, Complex64::new(f64::NAN, f64::NAN)))
}
