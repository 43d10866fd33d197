use crate::scale::Scale;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical unit of a value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    None,
    Hz,
    Farad,
    Henry,
    Ohm,
    Volt,
    Watt,
    Radian,
    VoltPerMeter,
    /// Electric dipole moment
    AmpereMeter,
    /// Magnetic dipole moment, and the electric moment times an impedance
    VoltMeter,
}

impl Unit {
    pub fn to_str(&self) -> &str {
        match self {
            Unit::None => "",
            Unit::Hz => "Hz",
            Unit::Farad => "F",
            Unit::Henry => "H",
            Unit::Ohm => "Ohm",
            Unit::Volt => "V",
            Unit::Watt => "W",
            Unit::Radian => "rad",
            Unit::VoltPerMeter => "V/m",
            Unit::AmpereMeter => "A*m",
            Unit::VoltMeter => "V*m",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Value with a display scale and a unit. Value is stored unscaled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitVal {
    val: f64,
    scale: Scale,
    unit: Unit,
}

impl UnitVal {
    pub fn new(val: f64, scale: Scale, unit: Unit) -> Self {
        UnitVal { val, scale, unit }
    }

    /// `val` given in `scale`, e.g. `3.29` pF
    pub fn new_scaled(val: f64, scale: Scale, unit: Unit) -> Self {
        UnitVal {
            val: scale.unscale(val),
            scale,
            unit,
        }
    }

    pub fn val(&self) -> f64 {
        self.val
    }

    pub fn val_scaled(&self) -> f64 {
        self.scale.scale(self.val)
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn with_scale(self, scale: Scale) -> Self {
        UnitVal { scale, ..self }
    }
}

impl fmt::Display for UnitVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.val_scaled(), self.scale, self.unit)
    }
}
