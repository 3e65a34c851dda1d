//! Softening-law calibration against measured curves.
//!
//! Responsibilities:
//!
//! - draw uniform seeds inside the bounds box and evaluate them (parallel)
//! - refine the best seed with a bounded simplex search
//! - report diagnostics and non-convergence warnings

pub mod calibrator;
pub mod seeding;

pub use calibrator::*;
pub use seeding::*;
