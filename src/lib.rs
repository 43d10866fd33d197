//! Equivalent electric and magnetic dipole moments of an antenna placed in a
//! TEM cell, extracted from two-port phase and coupling measurements.
//!
//! ```
//! use ndarray::array;
//! use num_complex::c64;
//! use temkit::prelude::*;
//!
//! let freq = Frequency::new(array![0.5, 1.0], Scale::Giga).unwrap();
//! let pair = PhasorPairBuilder::new()
//!     .field(FieldReference::Constant(c64(183.1858, 0.0)))
//!     .phase_shift(array![0.4, 0.9])
//!     .output_power(OutputPower::from_db(1.0, &array![-40.0, -38.5]).into_watts())
//!     .build();
//! let moments = pair.moments(&freq, &PhysicalConstants::default()).unwrap();
//! assert_eq!(moments.len(), 2);
//! ```
pub mod config;
pub mod consts;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod file;
pub mod frequency;
pub mod interp;
pub mod pipeline;
pub mod prelude;
pub mod report;
pub mod scale;
pub mod series;
pub mod unit;
pub mod util;
