//! Physical constants used by the moment extraction.
//!
//! The speed of light and the vacuum permeability are universal and built in.
//! Probe, geometry and circuit constants are never defined here; they are
//! supplied by the caller with each analysis.

use serde::{Deserialize, Serialize};

/// Speed of light in vacuum [m/s]
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Vacuum permeability [H/m], to the precision used for all reference data sets
pub const MU_0: f64 = 1.256637e-6;

/// Free-space wave impedance used to bring |m_e| onto the |m_m| axis for display [Ω]
pub const DISPLAY_IMPEDANCE: f64 = 377.0;

/// Universal constants entering the normalization step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhysicalConstants {
    pub speed_of_light: f64,
    pub mu_0: f64,
}

impl PhysicalConstants {
    pub fn new(speed_of_light: f64, mu_0: f64) -> Self {
        PhysicalConstants {
            speed_of_light,
            mu_0,
        }
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        PhysicalConstants {
            speed_of_light: SPEED_OF_LIGHT,
            mu_0: MU_0,
        }
    }
}
