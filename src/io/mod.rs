//! Input/output helpers.
//!
//! - target-curve ingest + validation (`ingest`)
//! - material card and curve dump writers (`export`)
//! - calibration JSON read/write (`fit_file`)

pub mod export;
pub mod fit_file;
pub mod ingest;

pub use export::*;
pub use fit_file::*;
pub use ingest::*;
