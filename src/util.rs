use float_cmp::{approx_eq, F64Margin};
use ndarray::{azip, Array1};
use num_complex::Complex64;

/// Margin used across the test suites: exact up to a handful of ulps.
pub const MARGIN: F64Margin = F64Margin {
    epsilon: 0.0,
    ulps: 16,
};

pub fn comp_array_f64(exemplar: &Array1<f64>, calc: &Array1<f64>, precision: F64Margin, test: &str) {
    assert_eq!(
        exemplar.len(),
        calc.len(),
        "Failed test {}: length mismatch",
        test
    );
    azip!((index i, &e in exemplar, &c in calc) {
        comp_f64(&e, &c, precision, test, format!("({})", i).as_str());
    });
}

pub fn comp_array_c64(
    exemplar: &Array1<Complex64>,
    calc: &Array1<Complex64>,
    precision: F64Margin,
    test: &str,
) {
    assert_eq!(
        exemplar.len(),
        calc.len(),
        "Failed test {}: length mismatch",
        test
    );
    azip!((index i, &e in exemplar, &c in calc) {
        comp_c64(&e, &c, precision, test, format!("({})", i).as_str());
    });
}

pub fn comp_vec_f64(exemplar: &[f64], calc: &[f64], precision: F64Margin, test: &str) {
    assert_eq!(
        exemplar.len(),
        calc.len(),
        "Failed test {}: length mismatch",
        test
    );
    for k in 0..calc.len() {
        comp_f64(&exemplar[k], &calc[k], precision, test, &format!("({})", k));
    }
}

pub fn comp_c64(exemplar: &Complex64, calc: &Complex64, precision: F64Margin, test: &str, idx: &str) {
    comp_f64(
        &(exemplar.re),
        &(calc.re),
        precision,
        test,
        &(idx.to_owned() + ".re"),
    );
    comp_f64(
        &(exemplar.im),
        &(calc.im),
        precision,
        test,
        &(idx.to_owned() + ".im"),
    );
}

pub fn comp_f64(exemplar: &f64, calc: &f64, precision: F64Margin, test: &str, idx: &str) {
    assert!(
        approx_eq!(f64, *calc, *exemplar, precision),
        " Failed test {} at location {}\n  exemplar: {}\n      calc: {}",
        test,
        idx,
        exemplar,
        calc
    );
}

/// Relative comparison, for values computed along different arithmetic paths.
pub fn comp_rel(exemplar: &f64, calc: &f64, rel: f64, test: &str, idx: &str) {
    let err = (calc - exemplar).abs();
    assert!(
        err <= rel * exemplar.abs() || err == 0.0,
        " Failed test {} at location {}\n  exemplar: {}\n      calc: {}\n  rel err: {}",
        test,
        idx,
        exemplar,
        calc,
        err / exemplar.abs()
    );
}

pub fn comp_array_rel(exemplar: &Array1<f64>, calc: &Array1<f64>, rel: f64, test: &str) {
    assert_eq!(
        exemplar.len(),
        calc.len(),
        "Failed test {}: length mismatch",
        test
    );
    azip!((index i, &e in exemplar, &c in calc) {
        comp_rel(&e, &c, rel, test, format!("({})", i).as_str());
    });
}

#[cfg(test)]
mod util_tests {
    use super::*;
    use ndarray::array;
    use num_complex::c64;

    #[test]
    fn comp_helpers_accept_equal() {
        comp_array_f64(&array![1.0, 2.0], &array![1.0, 2.0], MARGIN, "f64");
        comp_array_c64(
            &array![c64(1.0, -1.0)],
            &array![c64(1.0, -1.0)],
            MARGIN,
            "c64",
        );
        comp_array_rel(&array![1.0e-9, 4.0], &array![1.0e-9 * (1.0 + 1e-12), 4.0], 1e-9, "rel");
    }

    #[test]
    #[should_panic]
    fn comp_rel_rejects_far() {
        comp_rel(&1.0, &1.1, 1e-9, "far", "0");
    }
}
