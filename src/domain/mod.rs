//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - material and shape parameters (`MaterialParameters`, `CompressionShape`, `TensionShape`)
//! - typed curve records (`CurvePoint`, `StressStrainCurve`, `TargetCurve`)
//! - damage-plasticity table rows and card options (`DamagePoint`, `CdpOptions`)
//! - run configurations (`GenerationConfig`, `CalibrationConfig`)

pub mod types;

pub use types::*;
