use crate::consts::PhysicalConstants;
use crate::engine::{
    check_constants, check_field_reference, check_frequency, check_output_power, finite,
    finite_c64, non_negative, non_zero_c64, normalize, InputTraces, MomentStrategy, Moments,
    PerFrequency,
};
use crate::error::InvalidInputError;
use crate::frequency::Frequency;
use crate::scale::Scale;
use crate::unit::{Unit, UnitVal};
use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;
use tracing::debug;

/// Lumped components of the TEM-cell / antenna equivalent circuit.
#[derive(Clone, Debug, PartialEq)]
pub struct CircuitComponents {
    /// Septum-to-wall capacitance of each TEM-cell half, `C_t` [F]
    pub tem_capacitance: PerFrequency<f64>,
    /// Series inductance of each TEM-cell half, `L_t` [H]
    pub tem_inductance: PerFrequency<f64>,
    /// Antenna capacitance, `C_a` [F]
    pub antenna_capacitance: PerFrequency<f64>,
    /// Antenna inductance, `L_a` [H]
    pub antenna_inductance: PerFrequency<f64>,
}

impl CircuitComponents {
    fn validate(&self, npts: usize) -> Result<(), InvalidInputError> {
        self.tem_capacitance
            .check_each("tem_capacitance", npts, non_negative)?;
        self.tem_inductance
            .check_each("tem_inductance", npts, non_negative)?;
        self.antenna_capacitance
            .check_each("antenna_capacitance", npts, non_negative)?;
        self.antenna_inductance
            .check_each("antenna_inductance", npts, non_negative)?;
        Ok(())
    }

    /// Component values at the first sample, for logging. `None` while any
    /// component column is empty.
    pub(crate) fn describe(&self) -> Option<[UnitVal; 4]> {
        let components = [
            &self.tem_capacitance,
            &self.tem_inductance,
            &self.antenna_capacitance,
            &self.antenna_inductance,
        ];
        if components.iter().any(|c| c.len() == Some(0)) {
            return None;
        }
        Some([
            UnitVal::new(self.tem_capacitance.at(0), Scale::Pico, Unit::Farad),
            UnitVal::new(self.tem_inductance.at(0), Scale::Nano, Unit::Henry),
            UnitVal::new(self.antenna_capacitance.at(0), Scale::Femto, Unit::Farad),
            UnitVal::new(self.antenna_inductance.at(0), Scale::Nano, Unit::Henry),
        ])
    }
}

/// Builder design pattern for CircuitComponents. All components default to 0.
///
/// ## Example
/// ```
/// use temkit::engine::CircuitComponentsBuilder;
/// use temkit::scale::Scale;
/// use temkit::unit::{Unit, UnitVal};
///
/// let components = CircuitComponentsBuilder::new()
///     .tem_capacitance(UnitVal::new_scaled(3.29, Scale::Pico, Unit::Farad))
///     .tem_inductance(UnitVal::new_scaled(2.15, Scale::Nano, Unit::Henry))
///     .antenna_capacitance(38.36e-15)
///     .antenna_inductance(UnitVal::new_scaled(5.5, Scale::Nano, Unit::Henry))
///     .build();
/// assert!(components.tem_capacitance.is_constant());
/// assert_eq!(components.antenna_capacitance.at(0), 38.36e-15);
/// ```
pub struct CircuitComponentsBuilder {
    tem_capacitance: PerFrequency<f64>,
    tem_inductance: PerFrequency<f64>,
    antenna_capacitance: PerFrequency<f64>,
    antenna_inductance: PerFrequency<f64>,
}

impl Default for CircuitComponentsBuilder {
    fn default() -> Self {
        CircuitComponentsBuilder {
            tem_capacitance: PerFrequency::Constant(0.0),
            tem_inductance: PerFrequency::Constant(0.0),
            antenna_capacitance: PerFrequency::Constant(0.0),
            antenna_inductance: PerFrequency::Constant(0.0),
        }
    }
}

impl CircuitComponentsBuilder {
    pub fn new() -> Self {
        CircuitComponentsBuilder::default()
    }

    pub fn tem_capacitance(mut self, c: impl Into<PerFrequency<f64>>) -> Self {
        self.tem_capacitance = c.into();
        self
    }

    pub fn tem_inductance(mut self, l: impl Into<PerFrequency<f64>>) -> Self {
        self.tem_inductance = l.into();
        self
    }

    pub fn antenna_capacitance(mut self, c: impl Into<PerFrequency<f64>>) -> Self {
        self.antenna_capacitance = c.into();
        self
    }

    pub fn antenna_inductance(mut self, l: impl Into<PerFrequency<f64>>) -> Self {
        self.antenna_inductance = l.into();
        self
    }

    pub fn build(self) -> CircuitComponents {
        CircuitComponents {
            tem_capacitance: self.tem_capacitance,
            tem_inductance: self.tem_inductance,
            antenna_capacitance: self.antenna_capacitance,
            antenna_inductance: self.antenna_inductance,
        }
    }
}

/// Node voltages and branch currents of one frequency sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircuitSolution {
    pub frequency: f64,
    /// Output voltages across the reference loads
    pub u_1: Complex64,
    pub u_2: Complex64,
    /// Feed current `V / Z_in`
    pub i_in: Complex64,
    pub i_ca: Complex64,
    pub i_r1: Complex64,
    pub i_r2: Complex64,
    pub i_ct1: Complex64,
    pub i_ct2: Complex64,
    pub i_lt1: Complex64,
    pub i_lt2: Complex64,
    pub i_ck: Complex64,
    pub i_la: Complex64,
    pub u_lt1: Complex64,
    pub u_lt2: Complex64,
    /// `None` when both TEM-cell halves carry the same current
    pub mutual_inductance: Option<Complex64>,
    pub inductive_power: Complex64,
    /// Differential-mode term `sqrt(P_ind) / 2`
    pub a_minus_b: Complex64,
    /// Common-mode term `sqrt((i_Ca / 2)^2 R)`
    pub a_plus_b: Complex64,
}

/// Moments from the lumped equivalent circuit of the antenna feed and the
/// two TEM-cell halves terminated in the reference impedance.
#[derive(Clone, Debug, PartialEq)]
pub struct EquivalentCircuit {
    input_impedance: PerFrequency<Complex64>,
    input_voltage: PerFrequency<Complex64>,
    phase_1: PerFrequency<f64>,
    phase_2: PerFrequency<f64>,
    output_power: PerFrequency<f64>,
    reference_impedance: f64,
    field_reference: PerFrequency<Complex64>,
    components: CircuitComponents,
}

impl EquivalentCircuit {
    pub fn components(&self) -> &CircuitComponents {
        &self.components
    }

    pub fn reference_impedance(&self) -> f64 {
        self.reference_impedance
    }

    fn validate(&self, freq: &Frequency) -> Result<(), InvalidInputError> {
        let npts = freq.npts();
        check_frequency(freq.f())?;
        self.input_impedance
            .check_each("input_impedance", npts, non_zero_c64)?;
        self.input_voltage
            .check_each("input_voltage", npts, finite_c64)?;
        self.phase_1.check_each("phase_1", npts, finite)?;
        self.phase_2.check_each("phase_2", npts, finite)?;
        check_output_power(&self.output_power, npts)?;
        if !self.reference_impedance.is_finite() || self.reference_impedance <= 0.0 {
            return Err(InvalidInputError::domain(
                "reference_impedance",
                0,
                format!(
                    "reference impedance must be positive, got {}",
                    self.reference_impedance
                ),
            ));
        }
        check_field_reference("field_reference", &self.field_reference, npts)?;
        self.components.validate(npts)
    }

    fn solve_at(&self, i: usize, f: f64) -> CircuitSolution {
        let j = Complex64::i();
        let jw = j * 2.0 * PI * f;
        let r = self.reference_impedance;
        let v = self.input_voltage.at(i);
        let c_t = self.components.tem_capacitance.at(i);
        let l_t = self.components.tem_inductance.at(i);
        let c_a = self.components.antenna_capacitance.at(i);
        let l_a = self.components.antenna_inductance.at(i);

        let amplitude = (self.output_power.at(i) * r).sqrt();
        let u_1 = amplitude * (j * self.phase_1.at(i)).exp();
        let u_2 = amplitude * (j * self.phase_2.at(i)).exp();

        let i_ca = v * jw * c_a;
        let i_in = v / self.input_impedance.at(i);
        let i_r1 = u_1 / r;
        let i_r2 = u_2 / r;
        let i_ct1 = u_1 * jw * c_t;
        let i_ct2 = u_2 * jw * c_t;
        let i_lt1 = i_r1 + i_ct1;
        let i_lt2 = i_r2 + i_ct2;
        let i_ck = i_lt1 + i_lt2;
        let i_la = i_in - i_ca - i_ck;

        let u_lt1 = jw * l_t * i_lt1;
        let u_lt2 = jw * l_t * i_lt2;
        let split = jw * (i_lt1 - i_lt2);
        let mutual_inductance = if split.norm() > 0.0 {
            Some((v - jw * l_a * i_la) / split)
        } else {
            None
        };

        let inductive_power = i_la.conj() * v * i_la.arg().cos();
        let a_minus_b = inductive_power.sqrt() / 2.0;
        let a_plus_b = ((i_ca / 2.0).powi(2) * r).sqrt();

        CircuitSolution {
            frequency: f,
            u_1,
            u_2,
            i_in,
            i_ca,
            i_r1,
            i_r2,
            i_ct1,
            i_ct2,
            i_lt1,
            i_lt2,
            i_ck,
            i_la,
            u_lt1,
            u_lt2,
            mutual_inductance,
            inductive_power,
            a_minus_b,
            a_plus_b,
        }
    }

    /// Solve the circuit at every sample of `freq`
    pub fn solve(&self, freq: &Frequency) -> Result<Vec<CircuitSolution>, InvalidInputError> {
        self.validate(freq)?;
        Ok(freq
            .f()
            .iter()
            .enumerate()
            .map(|(i, &f)| self.solve_at(i, f))
            .collect())
    }
}

impl MomentStrategy for EquivalentCircuit {
    fn name(&self) -> &'static str {
        "equivalent-circuit"
    }

    fn moments(
        &self,
        freq: &Frequency,
        consts: &PhysicalConstants,
    ) -> Result<Moments, InvalidInputError> {
        check_constants(consts)?;
        let solutions = self.solve(freq)?;
        if let Some([c_t, l_t, c_a, l_a]) = self.components.describe() {
            debug!(
                c_t = %c_t,
                l_t = %l_t,
                c_a = %c_a,
                l_a = %l_a,
                r = self.reference_impedance,
                "equivalent circuit components"
            );
        }

        let samples = solutions
            .iter()
            .enumerate()
            .map(|(i, s)| {
                normalize(
                    s.a_plus_b,
                    s.a_minus_b,
                    self.field_reference.at(i),
                    s.frequency,
                    consts,
                )
            })
            .collect();

        if let Some(last) = solutions.last() {
            debug!(
                sum = last.a_plus_b.norm(),
                diff = last.a_minus_b.norm(),
                phase_deg = (self.phase_1.at(solutions.len() - 1)
                    - self.phase_2.at(solutions.len() - 1))
                .to_degrees(),
                "last sample common/differential mode"
            );
        }
        let moments = Moments::from_samples(samples);
        moments.log_peaks(self.name());
        Ok(moments)
    }

    fn inputs(&self, freq: &Frequency) -> Result<InputTraces, InvalidInputError> {
        self.validate(freq)?;
        let npts = freq.npts();
        Ok(InputTraces {
            phase_shift: Array1::from_shape_fn(npts, |i| {
                self.phase_1.at(i) - self.phase_2.at(i)
            }),
            output_power: self.output_power.to_array(npts),
            field_reference: self.field_reference.to_array(npts),
        })
    }
}

/// Builder for [`EquivalentCircuit`]. The reference impedance defaults to
/// 50 Ω; every other input must be supplied.
pub struct EquivalentCircuitBuilder {
    input_impedance: PerFrequency<Complex64>,
    input_voltage: PerFrequency<Complex64>,
    phase_1: PerFrequency<f64>,
    phase_2: PerFrequency<f64>,
    output_power: PerFrequency<f64>,
    reference_impedance: f64,
    field_reference: PerFrequency<Complex64>,
    components: CircuitComponents,
}

impl Default for EquivalentCircuitBuilder {
    fn default() -> Self {
        EquivalentCircuitBuilder {
            input_impedance: PerFrequency::Constant(Complex64::new(50.0, 0.0)),
            input_voltage: PerFrequency::Constant(Complex64::new(0.0, 0.0)),
            phase_1: PerFrequency::Constant(0.0),
            phase_2: PerFrequency::Constant(0.0),
            output_power: PerFrequency::Constant(0.0),
            reference_impedance: 50.0,
            field_reference: PerFrequency::Constant(Complex64::new(1.0, 0.0)),
            components: CircuitComponentsBuilder::new().build(),
        }
    }
}

impl EquivalentCircuitBuilder {
    pub fn new() -> Self {
        EquivalentCircuitBuilder::default()
    }

    pub fn input_impedance(mut self, z: impl Into<PerFrequency<Complex64>>) -> Self {
        self.input_impedance = z.into();
        self
    }

    pub fn input_voltage(mut self, v: impl Into<PerFrequency<Complex64>>) -> Self {
        self.input_voltage = v.into();
        self
    }

    pub fn phases(
        mut self,
        phase_1: impl Into<PerFrequency<f64>>,
        phase_2: impl Into<PerFrequency<f64>>,
    ) -> Self {
        self.phase_1 = phase_1.into();
        self.phase_2 = phase_2.into();
        self
    }

    pub fn output_power(mut self, p: impl Into<PerFrequency<f64>>) -> Self {
        self.output_power = p.into();
        self
    }

    pub fn reference_impedance(mut self, r: f64) -> Self {
        self.reference_impedance = r;
        self
    }

    pub fn field_reference(mut self, e: impl Into<PerFrequency<Complex64>>) -> Self {
        self.field_reference = e.into();
        self
    }

    pub fn components(mut self, components: CircuitComponents) -> Self {
        self.components = components;
        self
    }

    pub fn build(self) -> EquivalentCircuit {
        EquivalentCircuit {
            input_impedance: self.input_impedance,
            input_voltage: self.input_voltage,
            phase_1: self.phase_1,
            phase_2: self.phase_2,
            output_power: self.output_power,
            reference_impedance: self.reference_impedance,
            field_reference: self.field_reference,
            components: self.components,
        }
    }
}
