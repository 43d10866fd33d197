//! Derived measurement series: output power from coupling magnitude and the
//! phase shift between the two waveports.

use crate::error::InvalidInputError;
use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Power coupled to the output ports [W], `P = P_ref * 10^(mag_dB / 10)`.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputPower {
    p_ref: f64,
    watts: Array1<f64>,
}

impl OutputPower {
    pub fn from_db(p_ref: f64, mag_db: &Array1<f64>) -> OutputPower {
        OutputPower {
            p_ref,
            watts: mag_db.map(|db| p_ref * 10.0_f64.powf(db / 10.0)),
        }
    }

    pub fn reference(&self) -> f64 {
        self.p_ref
    }

    pub fn watts(&self) -> &Array1<f64> {
        &self.watts
    }

    pub fn into_watts(self) -> Array1<f64> {
        self.watts
    }
}

/// How the two port phases combine into the phase shift.
///
/// `Δφ = φ1' - φ2 - offset`, where `φ1' = φ1 - 2π` for positive `φ1` when
/// `wrap_positive_port1` is set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseConvention {
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub wrap_positive_port1: bool,
}

impl PhaseConvention {
    /// Plain difference `φ1 - φ2`
    pub fn direct() -> Self {
        PhaseConvention {
            offset: 0.0,
            wrap_positive_port1: false,
        }
    }

    /// One port wired with inverted polarity: positive port-1 phases are
    /// wrapped and π is taken off the difference
    pub fn inverted_port() -> Self {
        PhaseConvention {
            offset: PI,
            wrap_positive_port1: true,
        }
    }
}

impl Default for PhaseConvention {
    fn default() -> Self {
        PhaseConvention::direct()
    }
}

/// Phases of the two output waveports [rad], aligned to one frequency axis.
#[derive(Clone, Debug, PartialEq)]
pub struct PhasePair {
    port_1: Array1<f64>,
    port_2: Array1<f64>,
}

impl PhasePair {
    pub fn new(port_1: Array1<f64>, port_2: Array1<f64>) -> Result<Self, InvalidInputError> {
        if port_1.len() != port_2.len() {
            return Err(InvalidInputError::shape("port_2", port_1.len(), port_2.len()));
        }
        Ok(PhasePair { port_1, port_2 })
    }

    pub fn from_degrees(port_1: &Array1<f64>, port_2: &Array1<f64>) -> Result<Self, InvalidInputError> {
        PhasePair::new(port_1.map(|d| d.to_radians()), port_2.map(|d| d.to_radians()))
    }

    pub fn port_1(&self) -> &Array1<f64> {
        &self.port_1
    }

    pub fn port_2(&self) -> &Array1<f64> {
        &self.port_2
    }

    pub fn len(&self) -> usize {
        self.port_1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.port_1.is_empty()
    }

    /// Both port phases measured against a third reference phase, e.g. the
    /// antenna feed voltage
    pub fn relative_to(&self, reference: &Array1<f64>) -> Result<Self, InvalidInputError> {
        if reference.len() != self.len() {
            return Err(InvalidInputError::shape("reference_phase", self.len(), reference.len()));
        }
        PhasePair::new(&self.port_1 - reference, &self.port_2 - reference)
    }

    pub fn phase_shift(&self, convention: &PhaseConvention) -> Array1<f64> {
        let mut shift = Array1::zeros(self.len());
        for (i, s) in shift.iter_mut().enumerate() {
            let mut p1 = self.port_1[i];
            if convention.wrap_positive_port1 && p1 > 0.0 {
                p1 -= 2.0 * PI;
            }
            *s = p1 - self.port_2[i] - convention.offset;
        }
        shift
    }
}

/// Complex impedance from a magnitude and a phase in degrees
pub fn impedance_from_polar(magnitude: &Array1<f64>, phase_deg: &Array1<f64>) -> Result<Array1<Complex64>, InvalidInputError> {
    if magnitude.len() != phase_deg.len() {
        return Err(InvalidInputError::shape("impedance_phase", magnitude.len(), phase_deg.len()));
    }
    Ok(Array1::from_shape_fn(magnitude.len(), |i| {
        Complex64::from_polar(magnitude[i], phase_deg[i].to_radians())
    }))
}
