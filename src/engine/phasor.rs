use crate::consts::PhysicalConstants;
use crate::engine::{
    check_output_power, compute_moments_complex, FieldReference, InputTraces, MomentStrategy,
    Moments, PerFrequency,
};
use crate::error::InvalidInputError;
use crate::frequency::Frequency;
use num_complex::Complex64;

/// Two output-port phasors of equal amplitude `2P`, separated by the phase
/// shift between the ports.
#[derive(Clone, Debug, PartialEq)]
pub struct PhasorPair {
    field: FieldReference,
    phase_shift: PerFrequency<f64>,
    output_power: PerFrequency<f64>,
}

impl PhasorPair {
    pub fn new(
        field: FieldReference,
        phase_shift: impl Into<PerFrequency<f64>>,
        output_power: impl Into<PerFrequency<f64>>,
    ) -> Self {
        PhasorPair {
            field,
            phase_shift: phase_shift.into(),
            output_power: output_power.into(),
        }
    }

    pub fn field(&self) -> &FieldReference {
        &self.field
    }

    pub fn phase_shift(&self) -> &PerFrequency<f64> {
        &self.phase_shift
    }

    pub fn output_power(&self) -> &PerFrequency<f64> {
        &self.output_power
    }
}

impl MomentStrategy for PhasorPair {
    fn name(&self) -> &'static str {
        "phasor-pair"
    }

    fn moments(
        &self,
        freq: &Frequency,
        consts: &PhysicalConstants,
    ) -> Result<Moments, InvalidInputError> {
        let e_field = self.field.resolve(&self.output_power, freq.npts())?;
        compute_moments_complex(
            &e_field,
            &self.phase_shift,
            &self.output_power,
            freq.f(),
            consts,
        )
    }

    fn inputs(&self, freq: &Frequency) -> Result<InputTraces, InvalidInputError> {
        let npts = freq.npts();
        self.phase_shift.check_len("phase_shift", npts)?;
        check_output_power(&self.output_power, npts)?;
        let e_field = self.field.resolve(&self.output_power, npts)?;
        e_field.check_len("e_field", npts)?;
        Ok(InputTraces {
            phase_shift: self.phase_shift.to_array(npts),
            output_power: self.output_power.to_array(npts),
            field_reference: e_field.to_array(npts),
        })
    }
}

/// Builder for [`PhasorPair`]. The field reference defaults to a unit
/// constant and must normally be set.
pub struct PhasorPairBuilder {
    field: FieldReference,
    phase_shift: PerFrequency<f64>,
    output_power: PerFrequency<f64>,
}

impl Default for PhasorPairBuilder {
    fn default() -> Self {
        PhasorPairBuilder {
            field: FieldReference::Constant(Complex64::new(1.0, 0.0)),
            phase_shift: PerFrequency::Constant(0.0),
            output_power: PerFrequency::Constant(0.0),
        }
    }
}

impl PhasorPairBuilder {
    pub fn new() -> Self {
        PhasorPairBuilder::default()
    }

    pub fn field(mut self, field: FieldReference) -> Self {
        self.field = field;
        self
    }

    pub fn phase_shift(mut self, phase_shift: impl Into<PerFrequency<f64>>) -> Self {
        self.phase_shift = phase_shift.into();
        self
    }

    pub fn output_power(mut self, output_power: impl Into<PerFrequency<f64>>) -> Self {
        self.output_power = output_power.into();
        self
    }

    pub fn build(self) -> PhasorPair {
        PhasorPair {
            field: self.field,
            phase_shift: self.phase_shift,
            output_power: self.output_power,
        }
    }
}
