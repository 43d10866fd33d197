use crate::error::InvalidInputError;
use crate::scale::Scale;
use ndarray::Array1;
use std::f64::consts::PI;

/// Frequency axis shared by every derived quantity.
///
/// Points are stored in Hz. `scale` is the unit the axis was supplied in and
/// is used again for display. Points are positive, finite and strictly
/// increasing.
#[derive(Clone, Debug, PartialEq)]
pub struct Frequency {
    pts: Array1<f64>,
    scale: Scale,
}

impl Frequency {
    /// Build from values expressed in `scale` (e.g. GHz columns of an export)
    pub fn new(pts: Array1<f64>, scale: Scale) -> Result<Frequency, InvalidInputError> {
        let freq = Frequency {
            pts: scale.unscale_array(&pts),
            scale,
        };
        freq.validate()?;
        Ok(freq)
    }

    pub fn from_hz(pts: Array1<f64>) -> Result<Frequency, InvalidInputError> {
        Frequency::new(pts, Scale::Base)
    }

    pub fn from_vec(f: Vec<f64>, scale: Scale) -> Result<Frequency, InvalidInputError> {
        Frequency::new(Array1::from(f), scale)
    }

    /// Linear sweep of `npts` points, `start` and `stop` in `scale`
    pub fn from_lin_range(
        start: f64,
        stop: f64,
        npts: usize,
        scale: Scale,
    ) -> Result<Frequency, InvalidInputError> {
        let pts = if npts == 1 {
            Array1::from_elem(1, start)
        } else {
            Array1::linspace(start, stop, npts)
        };
        Frequency::new(pts, scale)
    }

    fn validate(&self) -> Result<(), InvalidInputError> {
        if self.pts.is_empty() {
            return Err(InvalidInputError::shape("frequency", 1, 0));
        }
        for (i, &f) in self.pts.iter().enumerate() {
            if !f.is_finite() || f <= 0.0 {
                return Err(InvalidInputError::domain(
                    "frequency",
                    i,
                    format!("frequency must be positive and finite, got {}", f),
                ));
            }
            if i > 0 && f <= self.pts[i - 1] {
                return Err(InvalidInputError::domain(
                    "frequency",
                    i,
                    format!(
                        "frequency axis must be strictly increasing, {} follows {}",
                        f,
                        self.pts[i - 1]
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Frequency points in Hz
    pub fn f(&self) -> &Array1<f64> {
        &self.pts
    }

    /// Frequency point `i` in Hz
    pub fn freq(&self, i: usize) -> f64 {
        self.pts[i]
    }

    pub fn f_scaled(&self) -> Array1<f64> {
        self.scale.scale_array(&self.pts)
    }

    pub fn freq_scaled(&self, i: usize) -> f64 {
        self.scale.scale(self.pts[i])
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Scale) {
        self.scale = scale;
    }

    pub fn npts(&self) -> usize {
        self.pts.len()
    }

    pub fn start(&self) -> f64 {
        self.pts[0]
    }

    pub fn stop(&self) -> f64 {
        self.pts[self.pts.len() - 1]
    }

    pub fn idx_at(&self, freq: f64, scale: Scale) -> Option<usize> {
        let target = scale.unscale(freq);
        self.pts.iter().position(|x| *x == target)
    }

    /// Angular frequency 2πf
    pub fn w(&self) -> Array1<f64> {
        self.pts.map(|f| 2.0 * PI * f)
    }

    /// Free-space wavelength c/f
    pub fn wavelength(&self, speed_of_light: f64) -> Array1<f64> {
        self.pts.map(|f| speed_of_light / f)
    }

    /// Wave number 2π/λ
    pub fn wave_number(&self, speed_of_light: f64) -> Array1<f64> {
        self.pts.map(|f| 2.0 * PI / (speed_of_light / f))
    }
}
