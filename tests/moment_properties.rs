use ndarray::prelude::*;
use num_complex::{c64, Complex64};
use proptest::prelude::*;
use std::f64::consts::PI;
use temkit::consts::{MU_0, SPEED_OF_LIGHT};
use temkit::engine::compute_moments;
use temkit::error::InvalidInputError;
use temkit::util::comp_rel;

// reference evaluation of one sample with b written as a conjugate
fn conj_reference(e: Complex64, x: f64, p: f64, f: f64) -> (f64, f64) {
    let a = c64(2.0 * p, 0.0);
    let b = (2.0 * p * (Complex64::i() * x).exp()).conj();
    let k = 2.0 * PI / (SPEED_OF_LIGHT / f);
    let m_e = (a + b) / e;
    let m_int = Complex64::i() * (a - b) / (e * k);
    let m_m = Complex64::i() * m_int * 2.0 * PI * f * MU_0;
    (m_e.norm(), m_m.norm())
}

fn field() -> impl Strategy<Value = Complex64> {
    (-1.0e3..1.0e3f64, -1.0e3..1.0e3f64)
        .prop_filter("non-zero field", |(re, im)| re.hypot(*im) > 1.0e-3)
        .prop_map(|(re, im)| c64(re, im))
}

proptest! {
    #[test]
    fn repeated_calls_are_bit_identical(
        e in field(),
        phase in -10.0..10.0f64,
        power in 1.0e-9..10.0f64,
        f in 1.0e6..1.0e11f64,
    ) {
        let first = compute_moments(e, phase, power, &array![f]).unwrap();
        let second = compute_moments(e, phase, power, &array![f]).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn negative_phase_matches_conjugate(
        e in field(),
        x in 0.0..10.0f64,
        power in 1.0e-9..10.0f64,
        f in 1.0e6..1.0e11f64,
    ) {
        let (m_e, m_m) = compute_moments(e, -x, power, &array![f]).unwrap();
        let (exp_e, exp_m) = conj_reference(e, x, power, f);
        comp_rel(&exp_e, &m_e[0], 1e-12, "conj m_e", "0");
        // |a - b| vanishes for x -> 0, compare against the scale of a
        let floor = 1e-12 * 4.0 * power * SPEED_OF_LIGHT * MU_0 / e.norm();
        prop_assert!((exp_m - m_m[0]).abs() <= 1e-12 * exp_m + floor);
    }

    #[test]
    fn doubling_power_doubles_moments(
        e in field(),
        phase in -10.0..10.0f64,
        power in 1.0e-9..10.0f64,
        f in 1.0e6..1.0e11f64,
    ) {
        let (e1, m1) = compute_moments(e, phase, power, &array![f]).unwrap();
        let (e2, m2) = compute_moments(e, phase, 2.0 * power, &array![f]).unwrap();
        comp_rel(&(2.0 * e1[0]), &e2[0], 1e-12, "scale m_e", "0");
        comp_rel(&(2.0 * m1[0]), &m2[0], 1e-12, "scale m_m", "0");
    }

    #[test]
    fn per_sample_equals_full_array(
        samples in prop::collection::vec(
            (field(), -10.0..10.0f64, 1.0e-9..10.0f64, 1.0e6..1.0e11f64),
            1..16,
        ),
    ) {
        let e: Array1<Complex64> = samples.iter().map(|s| s.0).collect();
        let phase: Array1<f64> = samples.iter().map(|s| s.1).collect();
        let power: Array1<f64> = samples.iter().map(|s| s.2).collect();
        let freq: Array1<f64> = samples.iter().map(|s| s.3).collect();

        let (m_e, m_m) = compute_moments(e, phase, power, &freq).unwrap();
        for (i, s) in samples.iter().enumerate() {
            let (se, sm) = compute_moments(s.0, s.1, s.2, &array![s.3]).unwrap();
            prop_assert_eq!(se[0], m_e[i]);
            prop_assert_eq!(sm[0], m_m[i]);
        }
    }

    #[test]
    fn zero_field_anywhere_is_rejected(n in 1usize..12, zero_at in 0usize..12) {
        let zero_at = zero_at % n;
        let mut e = Array1::from_elem(n, c64(1.0, 0.0));
        e[zero_at] = c64(0.0, 0.0);
        let freq = Array1::from_shape_fn(n, |i| 1.0e8 * (i + 1) as f64);
        let err = compute_moments(e, 0.3, 1.0, &freq).unwrap_err();
        prop_assert_eq!(
            err,
            InvalidInputError::InputDomain {
                input: "e_field",
                index: zero_at,
                reason: "field reference value is zero, division by it is undefined".to_string(),
            }
        );
    }
}

#[test]
fn degenerate_phase_gives_pure_electric_moment() {
    let (m_e, m_m) = compute_moments(c64(1.0, 0.0), 0.0, 1.0, &array![1.0e9]).unwrap();
    assert_eq!(m_e[0], 4.0);
    assert!(m_m[0].abs() < 1e-15);
}

#[test]
fn thesis_reference_case() {
    let e = c64(-820.958613447327, 43.4872792296905);
    let (m_e, m_m) = compute_moments(e, 0.6711, 1.0, &array![1.0e9]).unwrap();

    // a + b = 2 + 2 e^{i 0.6711}, a - b = 2 - 2 e^{i 0.6711}
    let sum = (2.0 + 2.0 * 0.6711_f64.cos()).hypot(2.0 * 0.6711_f64.sin());
    let diff = (2.0 - 2.0 * 0.6711_f64.cos()).hypot(2.0 * 0.6711_f64.sin());
    let exp_e = sum / e.norm();
    let exp_m = diff * SPEED_OF_LIGHT * MU_0 / e.norm();
    comp_rel(&exp_e, &m_e[0], 1e-9, "thesis m_e", "0");
    comp_rel(&exp_m, &m_m[0], 1e-9, "thesis m_m", "0");
}

#[test]
fn mismatched_lengths_are_rejected() {
    let err = compute_moments(
        array![c64(1.0, 0.0), c64(1.0, 0.0)],
        0.1,
        1.0,
        &array![1.0e9, 2.0e9, 3.0e9],
    )
    .unwrap_err();
    assert_eq!(err, InvalidInputError::InputShape {
        input: "e_field",
        expected: 3,
        found: 2,
    });
    assert!(err.to_string().contains("e_field"));
}
