//! Piecewise-analytic envelope curves for concrete.
//!
//! Models are implemented as small, pure functions so that the calibrator can
//! evaluate the softening branches directly and the generator can sample the
//! full curves.

pub mod compression;
pub mod tension;

pub use compression::{compression_curve, compression_stress, softening_end_strain, validate_material};
pub use tension::{tension_curve, tension_stress};
