//! Equivalent dipole-moment extraction.
//!
//! Every strategy reduces its inputs to a common-mode term `a + b` and a
//! differential-mode term `a - b` per frequency sample and hands both to
//! [`normalize`], which divides out the field reference and wave number.
//! Samples are independent of each other; all inputs are validated before
//! any output is produced.

use crate::consts::PhysicalConstants;
use crate::error::InvalidInputError;
use crate::frequency::Frequency;
use crate::unit::UnitVal;
use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;
use tracing::debug;

pub mod circuit;
pub mod phasor;

pub use self::circuit::{
    CircuitComponents, CircuitComponentsBuilder, CircuitSolution, EquivalentCircuit,
    EquivalentCircuitBuilder,
};
pub use self::phasor::{PhasorPair, PhasorPairBuilder};

/// An operand that is either one value for every sample or an array aligned
/// to the frequency axis.
#[derive(Clone, Debug, PartialEq)]
pub enum PerFrequency<T> {
    Constant(T),
    Aligned(Array1<T>),
}

impl<T: Copy> PerFrequency<T> {
    /// Value at sample `i`. `Aligned` operands must have been length-checked.
    pub fn at(&self, i: usize) -> T {
        match self {
            PerFrequency::Constant(v) => *v,
            PerFrequency::Aligned(a) => a[i],
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            PerFrequency::Constant(_) => None,
            PerFrequency::Aligned(a) => Some(a.len()),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, PerFrequency::Constant(_))
    }

    pub fn check_len(&self, input: &'static str, npts: usize) -> Result<(), InvalidInputError> {
        match self.len() {
            Some(n) if n != npts => Err(InvalidInputError::shape(input, npts, n)),
            _ => Ok(()),
        }
    }

    /// Check every sample with `valid`, reporting the first failure.
    pub fn check_each<F>(
        &self,
        input: &'static str,
        npts: usize,
        valid: F,
    ) -> Result<(), InvalidInputError>
    where
        F: Fn(T) -> Result<(), String>,
    {
        self.check_len(input, npts)?;
        match self {
            PerFrequency::Constant(v) => valid(*v).map_err(|r| InvalidInputError::domain(input, 0, r)),
            PerFrequency::Aligned(a) => {
                for (i, v) in a.iter().enumerate() {
                    valid(*v).map_err(|r| InvalidInputError::domain(input, i, r))?;
                }
                Ok(())
            }
        }
    }

    pub fn to_array(&self, npts: usize) -> Array1<T> {
        Array1::from_shape_fn(npts, |i| self.at(i))
    }
}

impl From<f64> for PerFrequency<f64> {
    fn from(v: f64) -> Self {
        PerFrequency::Constant(v)
    }
}

impl From<Array1<f64>> for PerFrequency<f64> {
    fn from(v: Array1<f64>) -> Self {
        PerFrequency::Aligned(v)
    }
}

impl From<&Array1<f64>> for PerFrequency<f64> {
    fn from(v: &Array1<f64>) -> Self {
        PerFrequency::Aligned(v.clone())
    }
}

impl From<Vec<f64>> for PerFrequency<f64> {
    fn from(v: Vec<f64>) -> Self {
        PerFrequency::Aligned(Array1::from(v))
    }
}

impl From<UnitVal> for PerFrequency<f64> {
    fn from(v: UnitVal) -> Self {
        PerFrequency::Constant(v.val())
    }
}

impl From<Complex64> for PerFrequency<Complex64> {
    fn from(v: Complex64) -> Self {
        PerFrequency::Constant(v)
    }
}

impl From<f64> for PerFrequency<Complex64> {
    fn from(v: f64) -> Self {
        PerFrequency::Constant(Complex64::new(v, 0.0))
    }
}

impl From<Array1<Complex64>> for PerFrequency<Complex64> {
    fn from(v: Array1<Complex64>) -> Self {
        PerFrequency::Aligned(v)
    }
}

impl From<&Array1<Complex64>> for PerFrequency<Complex64> {
    fn from(v: &Array1<Complex64>) -> Self {
        PerFrequency::Aligned(v.clone())
    }
}

impl From<Vec<Complex64>> for PerFrequency<Complex64> {
    fn from(v: Vec<Complex64>) -> Self {
        PerFrequency::Aligned(Array1::from(v))
    }
}

// real field samples (approximation path)
impl From<Array1<f64>> for PerFrequency<Complex64> {
    fn from(v: Array1<f64>) -> Self {
        PerFrequency::Aligned(v.map(|&x| Complex64::new(x, 0.0)))
    }
}

/// Where the calibration field reference comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldReference {
    /// Directly measured or field-calculator samples [V/m]
    Measured(Array1<Complex64>),
    /// One reference value for every sample [V/m]
    Constant(Complex64),
    /// `E = sqrt(P) / geometry_constant`, from the output power
    FreeSpace { geometry_constant: f64 },
}

impl FieldReference {
    pub fn name(&self) -> &'static str {
        match self {
            FieldReference::Measured(_) => "measured",
            FieldReference::Constant(_) => "constant",
            FieldReference::FreeSpace { .. } => "free-space",
        }
    }

    /// Field reference per sample. The free-space approximation needs the
    /// output power it is derived from.
    pub fn resolve(
        &self,
        output_power: &PerFrequency<f64>,
        npts: usize,
    ) -> Result<PerFrequency<Complex64>, InvalidInputError> {
        match self {
            FieldReference::Measured(e) => Ok(PerFrequency::Aligned(e.clone())),
            FieldReference::Constant(e) => Ok(PerFrequency::Constant(*e)),
            FieldReference::FreeSpace { geometry_constant } => {
                let k_geom = *geometry_constant;
                if !k_geom.is_finite() || k_geom == 0.0 {
                    return Err(InvalidInputError::domain(
                        "geometry_constant",
                        0,
                        format!("geometry constant must be finite and non-zero, got {}", k_geom),
                    ));
                }
                check_output_power(output_power, npts)?;
                let e = Array1::from_shape_fn(npts, |i| {
                    Complex64::new(output_power.at(i).sqrt() / k_geom, 0.0)
                });
                Ok(PerFrequency::Aligned(e))
            }
        }
    }
}

/// Electric and magnetic dipole moments aligned to a frequency axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Moments {
    electric: Array1<Complex64>,
    magnetic: Array1<Complex64>,
    magnetic_intermediate: Array1<Complex64>,
}

impl Moments {
    pub fn len(&self) -> usize {
        self.electric.len()
    }

    pub fn is_empty(&self) -> bool {
        self.electric.is_empty()
    }

    /// |m_e| per sample
    pub fn electric(&self) -> Array1<f64> {
        self.electric.map(|m| m.norm())
    }

    /// |m_m| per sample
    pub fn magnetic(&self) -> Array1<f64> {
        self.magnetic.map(|m| m.norm())
    }

    pub fn electric_complex(&self) -> &Array1<Complex64> {
        &self.electric
    }

    pub fn magnetic_complex(&self) -> &Array1<Complex64> {
        &self.magnetic
    }

    /// `i (a - b) / (E k)` before rescaling by `2πf mu0`
    pub fn magnetic_intermediate(&self) -> &Array1<Complex64> {
        &self.magnetic_intermediate
    }

    pub fn into_magnitudes(self) -> (Array1<f64>, Array1<f64>) {
        (self.electric(), self.magnetic())
    }

    pub(crate) fn from_samples(samples: Vec<(Complex64, Complex64, Complex64)>) -> Moments {
        let n = samples.len();
        let mut electric = Array1::zeros(n);
        let mut magnetic = Array1::zeros(n);
        let mut magnetic_intermediate = Array1::zeros(n);
        for (i, (m_e, m_int, m_m)) in samples.into_iter().enumerate() {
            electric[i] = m_e;
            magnetic_intermediate[i] = m_int;
            magnetic[i] = m_m;
        }
        Moments {
            electric,
            magnetic,
            magnetic_intermediate,
        }
    }

    fn log_peaks(&self, strategy: &str) {
        let max_e = self.electric().fold(0.0_f64, |acc, &m| acc.max(m));
        let max_m = self.magnetic().fold(0.0_f64, |acc, &m| acc.max(m));
        debug!(
            strategy,
            npts = self.len(),
            max_electric = max_e,
            max_magnetic = max_m,
            "dipole moment peaks"
        );
    }
}

/// Per-sample inputs the moments were derived from, for inspection next to
/// the moments.
#[derive(Clone, Debug, PartialEq)]
pub struct InputTraces {
    /// Phase shift between the two output ports [rad]
    pub phase_shift: Array1<f64>,
    /// Power coupled to the output ports [W]
    pub output_power: Array1<f64>,
    /// Resolved field reference [V/m]
    pub field_reference: Array1<Complex64>,
}

impl InputTraces {
    pub fn len(&self) -> usize {
        self.phase_shift.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phase_shift.is_empty()
    }
}

/// Normalization step shared by all strategies.
///
/// Returns `(m_electric, m_intermediate, m_magnetic)`:
/// `m_e = (a+b)/E`, `m_int = i (a-b) / (E k)`, `m_m = i m_int 2πf mu0`.
pub fn normalize(
    sum: Complex64,
    diff: Complex64,
    e_field: Complex64,
    frequency: f64,
    consts: &PhysicalConstants,
) -> (Complex64, Complex64, Complex64) {
    let j = Complex64::i();
    let wavelength = consts.speed_of_light / frequency;
    let wave_number = 2.0 * PI / wavelength;

    let m_electric = sum / e_field;
    let m_intermediate = j * diff / (e_field * wave_number);
    let m_magnetic = j * m_intermediate * 2.0 * PI * frequency * consts.mu_0;

    (m_electric, m_intermediate, m_magnetic)
}

/// Moment magnitudes `(|m_e|, |m_m|)` from the phasor-pair model with the
/// built-in physical constants.
///
/// ```
/// use ndarray::array;
/// use num_complex::Complex64;
/// use temkit::engine::compute_moments;
///
/// let (m_e, m_m) = compute_moments(
///     Complex64::new(1.0, 0.0),
///     0.0,
///     1.0,
///     &array![1.0e9],
/// )
/// .unwrap();
/// assert_eq!(m_e[0], 4.0);
/// assert_eq!(m_m[0], 0.0);
/// ```
pub fn compute_moments<E, P, Q>(
    e_field: E,
    phase_shift: P,
    output_power: Q,
    frequency: &Array1<f64>,
) -> Result<(Array1<f64>, Array1<f64>), InvalidInputError>
where
    E: Into<PerFrequency<Complex64>>,
    P: Into<PerFrequency<f64>>,
    Q: Into<PerFrequency<f64>>,
{
    let moments = compute_moments_complex(
        &e_field.into(),
        &phase_shift.into(),
        &output_power.into(),
        frequency,
        &PhysicalConstants::default(),
    )?;
    Ok(moments.into_magnitudes())
}

/// Phasor-pair moments retaining the complex values.
pub fn compute_moments_complex(
    e_field: &PerFrequency<Complex64>,
    phase_shift: &PerFrequency<f64>,
    output_power: &PerFrequency<f64>,
    frequency: &Array1<f64>,
    consts: &PhysicalConstants,
) -> Result<Moments, InvalidInputError> {
    let npts = frequency.len();
    check_frequency(frequency)?;
    check_field_reference("e_field", e_field, npts)?;
    phase_shift.check_each("phase_shift", npts, finite)?;
    check_output_power(output_power, npts)?;
    check_constants(consts)?;

    let j = Complex64::i();
    let mut samples = Vec::with_capacity(npts);
    let mut last = (Complex64::default(), Complex64::default());
    for (i, &f) in frequency.iter().enumerate() {
        let a = Complex64::new(2.0 * output_power.at(i), 0.0);
        let b = 2.0 * output_power.at(i) * (j * phase_shift.at(i)).exp();
        last = (a + b, a - b);
        samples.push(normalize(a + b, a - b, e_field.at(i), f, consts));
    }

    debug!(
        sum = last.0.norm(),
        diff = last.1.norm(),
        phase_deg = phase_shift.at(npts - 1).to_degrees(),
        "last sample common/differential mode"
    );
    let moments = Moments::from_samples(samples);
    moments.log_peaks("phasor-pair");
    Ok(moments)
}

/// A named way of turning measurement data into dipole moments.
pub trait MomentStrategy {
    fn name(&self) -> &'static str;

    fn moments(
        &self,
        freq: &Frequency,
        consts: &PhysicalConstants,
    ) -> Result<Moments, InvalidInputError>;

    /// Phase shift, output power and field reference aligned to `freq`
    fn inputs(&self, freq: &Frequency) -> Result<InputTraces, InvalidInputError>;
}

/// Strategy selected explicitly by the caller
#[derive(Clone, Debug, PartialEq)]
pub enum Strategy {
    PhasorPair(PhasorPair),
    EquivalentCircuit(EquivalentCircuit),
}

macro_rules! define_strategy_impl {
    (variants: [$($variant:ident),+ $(,)?]) => {
        impl MomentStrategy for Strategy {
            fn name(&self) -> &'static str {
                match self {
                    $(
                        Strategy::$variant(s) => s.name(),
                    )+
                }
            }

            fn moments(
                &self,
                freq: &Frequency,
                consts: &PhysicalConstants,
            ) -> Result<Moments, InvalidInputError> {
                match self {
                    $(
                        Strategy::$variant(s) => s.moments(freq, consts),
                    )+
                }
            }

            fn inputs(&self, freq: &Frequency) -> Result<InputTraces, InvalidInputError> {
                match self {
                    $(
                        Strategy::$variant(s) => s.inputs(freq),
                    )+
                }
            }
        }

        $(
            impl From<$variant> for Strategy {
                fn from(s: $variant) -> Self {
                    Strategy::$variant(s)
                }
            }
        )+
    };
}

define_strategy_impl!(variants: [PhasorPair, EquivalentCircuit]);

pub(crate) fn finite(v: f64) -> Result<(), String> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(format!("value must be finite, got {}", v))
    }
}

pub(crate) fn non_negative(v: f64) -> Result<(), String> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(format!("value must be finite and non-negative, got {}", v))
    }
}

pub(crate) fn finite_c64(v: Complex64) -> Result<(), String> {
    if v.re.is_finite() && v.im.is_finite() {
        Ok(())
    } else {
        Err(format!("value must be finite, got {}", v))
    }
}

pub(crate) fn non_zero_c64(v: Complex64) -> Result<(), String> {
    finite_c64(v)?;
    if v.re == 0.0 && v.im == 0.0 {
        Err("value is zero, division by it is undefined".to_string())
    } else {
        Ok(())
    }
}

pub(crate) fn check_frequency(frequency: &Array1<f64>) -> Result<(), InvalidInputError> {
    if frequency.is_empty() {
        return Err(InvalidInputError::shape("frequency", 1, 0));
    }
    for (i, &f) in frequency.iter().enumerate() {
        if !f.is_finite() || f <= 0.0 {
            return Err(InvalidInputError::domain(
                "frequency",
                i,
                format!("frequency must be positive and finite, got {}", f),
            ));
        }
    }
    Ok(())
}

pub(crate) fn check_field_reference(
    input: &'static str,
    e_field: &PerFrequency<Complex64>,
    npts: usize,
) -> Result<(), InvalidInputError> {
    e_field.check_each(input, npts, |e| {
        non_zero_c64(e).map_err(|r| format!("field reference {}", r))
    })
}

pub(crate) fn check_output_power(
    output_power: &PerFrequency<f64>,
    npts: usize,
) -> Result<(), InvalidInputError> {
    output_power.check_each("output_power", npts, non_negative)
}

pub(crate) fn check_constants(consts: &PhysicalConstants) -> Result<(), InvalidInputError> {
    if !consts.speed_of_light.is_finite() || consts.speed_of_light <= 0.0 {
        return Err(InvalidInputError::domain(
            "speed_of_light",
            0,
            format!("must be positive, got {}", consts.speed_of_light),
        ));
    }
    if !consts.mu_0.is_finite() || consts.mu_0 <= 0.0 {
        return Err(InvalidInputError::domain(
            "mu_0",
            0,
            format!("must be positive, got {}", consts.mu_0),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod engine_tests {
    use super::*;
    use crate::consts::{MU_0, SPEED_OF_LIGHT};
    use crate::util::{comp_array_f64, comp_f64, comp_rel, MARGIN};
    use ndarray::array;
    use num_complex::c64;

    // independent closed-form evaluation of one sample
    fn reference(e: Complex64, phase: f64, power: f64, f: f64) -> (f64, f64) {
        let a = 2.0 * power;
        let b = c64(2.0 * power * phase.cos(), 2.0 * power * phase.sin());
        let k = 2.0 * PI * f / SPEED_OF_LIGHT;
        let m_e = (a + b) / e;
        let m_m = (a - b) / (e * k) * 2.0 * PI * f * MU_0;
        (m_e.norm(), m_m.norm())
    }

    #[test]
    fn degenerate_phase() {
        let (m_e, m_m) =
            compute_moments(c64(1.0, 0.0), array![0.0], array![1.0], &array![1.0e9]).unwrap();
        comp_f64(&4.0, &m_e[0], MARGIN, "degenerate m_e", "0");
        assert!(m_m[0].abs() < 1e-15);
    }

    #[test]
    fn reference_numeric_case() {
        let e = c64(-820.958613447327, 43.4872792296905);
        let (m_e, m_m) = compute_moments(e, 0.6711, 1.0, &array![1.0e9]).unwrap();
        let (exp_e, exp_m) = reference(e, 0.6711, 1.0, 1.0e9);
        comp_rel(&exp_e, &m_e[0], 1e-9, "reference m_e", "0");
        comp_rel(&exp_m, &m_m[0], 1e-9, "reference m_m", "0");
    }

    #[test]
    fn magnetic_magnitude_closed_form() {
        // |m_m| = |a - b| c mu0 / |E|, the frequency cancels
        let e = c64(3.0, -4.0);
        let phase = 1.2;
        let (_, m_m) = compute_moments(e, phase, 0.5, &array![1.0e8, 7.0e8]).unwrap();
        let a_minus_b = (c64(1.0, 0.0) - (Complex64::i() * phase).exp()).norm();
        let expected = a_minus_b * SPEED_OF_LIGHT * MU_0 / 5.0;
        comp_rel(&expected, &m_m[0], 1e-12, "closed form", "0");
        comp_rel(&expected, &m_m[1], 1e-12, "closed form", "1");
    }

    #[test]
    fn broadcast_and_aligned_agree() {
        let freq = array![1.0e8, 5.0e8, 1.0e9];
        let (e1, m1) = compute_moments(c64(2.0, 1.0), 0.3, 1.5, &freq).unwrap();
        let (e2, m2) = compute_moments(
            array![c64(2.0, 1.0), c64(2.0, 1.0), c64(2.0, 1.0)],
            array![0.3, 0.3, 0.3],
            array![1.5, 1.5, 1.5],
            &freq,
        )
        .unwrap();
        comp_array_f64(&e1, &e2, MARGIN, "broadcast m_e");
        comp_array_f64(&m1, &m2, MARGIN, "broadcast m_m");
    }

    #[test]
    fn complex_values_are_retained() {
        let consts = PhysicalConstants::default();
        let moments = compute_moments_complex(
            &PerFrequency::Constant(c64(1.0, 0.0)),
            &PerFrequency::Constant(PI),
            &PerFrequency::Constant(1.0),
            &array![1.0e9],
            &consts,
        )
        .unwrap();
        // a + b = 0, a - b = 4
        assert!(moments.electric_complex()[0].norm() < 1e-12);
        let k = 2.0 * PI * 1.0e9 / SPEED_OF_LIGHT;
        let m_int = moments.magnetic_intermediate()[0];
        comp_rel(&(4.0 / k), &m_int.norm(), 1e-12, "intermediate", "0");
        // i * i (a - b) is real and negative
        assert!(moments.magnetic_complex()[0].re < 0.0);
    }

    #[test]
    fn zero_field_is_rejected() {
        let err = compute_moments(
            array![c64(1.0, 0.0), c64(0.0, 0.0)],
            0.1,
            1.0,
            &array![1.0e9, 2.0e9],
        )
        .unwrap_err();
        assert_eq!(err.input(), "e_field");
        assert!(err.is_domain());
        match err {
            InvalidInputError::InputDomain { index, .. } => assert_eq!(index, 1),
            _ => panic!("expected domain error"),
        }
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = compute_moments(
            c64(1.0, 0.0),
            array![0.1, 0.2],
            1.0,
            &array![1.0e9, 2.0e9, 3.0e9],
        )
        .unwrap_err();
        assert_eq!(err, InvalidInputError::shape("phase_shift", 3, 2));
    }

    #[test]
    fn non_positive_frequency_is_rejected() {
        let err = compute_moments(c64(1.0, 0.0), 0.1, 1.0, &array![1.0e9, -1.0]).unwrap_err();
        assert_eq!(err.input(), "frequency");
        let err = compute_moments(c64(1.0, 0.0), 0.1, 1.0, &Array1::<f64>::zeros(0)).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn negative_power_and_nan_phase_are_rejected() {
        let err = compute_moments(c64(1.0, 0.0), 0.1, -1.0, &array![1.0e9]).unwrap_err();
        assert_eq!(err.input(), "output_power");
        let err = compute_moments(c64(1.0, 0.0), f64::NAN, 1.0, &array![1.0e9]).unwrap_err();
        assert_eq!(err.input(), "phase_shift");
    }

    #[test]
    fn free_space_field_reference() {
        let power = PerFrequency::Aligned(array![4.0, 9.0]);
        let field = FieldReference::FreeSpace {
            geometry_constant: 0.5,
        };
        let e = field.resolve(&power, 2).unwrap();
        comp_f64(&4.0, &e.at(0).re, MARGIN, "sqrt(P)/k", "0");
        comp_f64(&6.0, &e.at(1).re, MARGIN, "sqrt(P)/k", "1");

        let bad = FieldReference::FreeSpace {
            geometry_constant: 0.0,
        };
        assert_eq!(bad.resolve(&power, 2).unwrap_err().input(), "geometry_constant");
    }

    #[test]
    fn per_frequency_to_array() {
        let c: PerFrequency<f64> = 2.0.into();
        comp_array_f64(&array![2.0, 2.0], &c.to_array(2), MARGIN, "to_array");
        assert!(c.is_constant());
        let a: PerFrequency<f64> = vec![1.0, 2.0].into();
        assert_eq!(a.len(), Some(2));
        assert!(a.check_len("a", 3).is_err());
    }
}
