//! Numerical utilities: range sampling, monotone interpolation, bounded simplex search.

pub mod pchip;
pub mod simplex;
pub mod space;

pub use pchip::*;
pub use simplex::*;
pub use space::*;
