use std::fmt;

/// Rejection of engine inputs. Raised before any output is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidInputError {
    /// An aligned input does not match the length of the frequency axis,
    /// or the frequency axis itself is empty.
    InputShape {
        input: &'static str,
        expected: usize,
        found: usize,
    },
    /// A sample is physically invalid, e.g. a zero field reference.
    InputDomain {
        input: &'static str,
        index: usize,
        reason: String,
    },
}

impl InvalidInputError {
    pub(crate) fn shape(input: &'static str, expected: usize, found: usize) -> Self {
        InvalidInputError::InputShape {
            input,
            expected,
            found,
        }
    }

    pub(crate) fn domain(input: &'static str, index: usize, reason: impl Into<String>) -> Self {
        InvalidInputError::InputDomain {
            input,
            index,
            reason: reason.into(),
        }
    }

    /// Name of the offending input
    pub fn input(&self) -> &'static str {
        match self {
            InvalidInputError::InputShape { input, .. } => input,
            InvalidInputError::InputDomain { input, .. } => input,
        }
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, InvalidInputError::InputShape { .. })
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, InvalidInputError::InputDomain { .. })
    }
}

impl fmt::Display for InvalidInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidInputError::InputShape {
                input,
                expected,
                found,
            } => write!(
                f,
                "Input shape error: `{}` has {} samples, expected {}",
                input, found, expected
            ),
            InvalidInputError::InputDomain {
                input,
                index,
                reason,
            } => write!(
                f,
                "Input domain error: `{}` at sample {}: {}",
                input, index, reason
            ),
        }
    }
}

impl std::error::Error for InvalidInputError {}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn display_names_input_and_invariant() {
        let err = InvalidInputError::shape("phase_shift", 4, 3);
        assert_eq!(
            err.to_string(),
            "Input shape error: `phase_shift` has 3 samples, expected 4"
        );
        assert!(err.is_shape());
        assert_eq!(err.input(), "phase_shift");

        let err = InvalidInputError::domain("e_field", 2, "field reference is zero");
        assert_eq!(
            err.to_string(),
            "Input domain error: `e_field` at sample 2: field reference is zero"
        );
        assert!(err.is_domain());
    }
}
