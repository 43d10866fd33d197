//! temkit prelude.
//!
//! This module contains the most used types, traits and functions that you
//! can import easily as a group.
//!
//! ```
//! use temkit::prelude::*;
//!
//! ```

#[doc(no_inline)]
pub use crate::config::{AnalysisConfig, StrategyConfig};

#[doc(no_inline)]
pub use crate::consts::{PhysicalConstants, DISPLAY_IMPEDANCE, MU_0, SPEED_OF_LIGHT};

#[doc(no_inline)]
pub use crate::dataset::MeasurementSet;

#[doc(no_inline)]
pub use crate::engine::{
    compute_moments, compute_moments_complex, normalize, CircuitComponents,
    CircuitComponentsBuilder, CircuitSolution, EquivalentCircuit, EquivalentCircuitBuilder,
    FieldReference, MomentStrategy, Moments, PerFrequency, PhasorPair, PhasorPairBuilder,
    Strategy,
};

#[doc(no_inline)]
pub use crate::error::InvalidInputError;

#[doc(no_inline)]
pub use crate::file::{read_column, read_columns, read_field_export};

#[doc(no_inline)]
pub use crate::frequency::Frequency;

#[doc(no_inline)]
pub use crate::interp::{interp, interp_complex};

#[doc(no_inline)]
pub use crate::pipeline::{run, Analysis};

#[doc(no_inline)]
pub use crate::report::{render, MomentReport, ReportConfig};

#[doc(no_inline)]
pub use crate::scale::Scale;

#[doc(no_inline)]
pub use crate::series::{OutputPower, PhaseConvention, PhasePair};

#[doc(no_inline)]
pub use crate::unit::{Unit, UnitVal};
