//! Shared domain types.
//!
//! These types are intentionally small, `Copy` where possible, and
//! serializable so they can be:
//!
//! - passed by value into the pure curve/fit/damage functions
//! - written to (and re-read from) the calibration JSON file
//! - echoed in terminal reports

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Fraction of `S_cu` kept as the asymptotic residual of compression softening.
pub const COMPRESSION_RESIDUAL: f64 = 0.01;

/// Amplitude of the Weibull decay term (`1 - COMPRESSION_RESIDUAL`).
pub const COMPRESSION_DECAY_AMPLITUDE: f64 = 0.99;

/// Loading direction of a uniaxial envelope curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loading {
    Compression,
    Tension,
}

impl Loading {
    pub fn display_name(self) -> &'static str {
        match self {
            Loading::Compression => "Compression",
            Loading::Tension => "Tension",
        }
    }
}

/// Analytic segment a curve point was sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Elastic,
    Hardening,
    Softening,
}

/// Unit system of the emitted material card.
///
/// The curve model always works in MPa. `Metre` rescales stresses and moduli
/// to Pa and the density to kg/m³ when the card is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// mm, N, MPa, tonne/mm³.
    Millimetre,
    /// m, N, Pa, kg/m³.
    Metre,
}

impl UnitSystem {
    /// Multiplier applied to every stress and modulus.
    pub fn stress_scale(self) -> f64 {
        match self {
            UnitSystem::Millimetre => 1.0,
            UnitSystem::Metre => 1e6,
        }
    }

    /// Multiplier applied to the density.
    pub fn density_scale(self) -> f64 {
        match self {
            UnitSystem::Millimetre => 1.0,
            UnitSystem::Metre => 1e12,
        }
    }
}

/// Elastic and ultimate-point properties of the material.
///
/// All stresses and the modulus are in MPa.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialParameters {
    /// Young's modulus `E` (MPa).
    pub elastic_modulus: f64,
    /// Compressive ultimate stress `S_cu` (MPa).
    pub s_cu: f64,
    /// Strain at the compressive ultimate stress `e_cu`.
    pub e_cu: f64,
    /// Tensile ultimate stress `S_tu` (MPa).
    pub s_tu: f64,
}

impl MaterialParameters {
    /// Build from a modulus given in GPa (the customary input unit).
    pub fn from_gpa(e_gpa: f64, s_cu: f64, e_cu: f64, s_tu: f64) -> Self {
        Self {
            elastic_modulus: e_gpa * 1000.0,
            s_cu,
            e_cu,
            s_tu,
        }
    }

    /// Stress at the start of parabolic hardening, `S_c0 = 2·S_cu − E·e_cu`.
    pub fn s_c0(&self) -> f64 {
        2.0 * self.s_cu - self.elastic_modulus * self.e_cu
    }

    /// Strain at the start of parabolic hardening, `e_0 = S_c0 / E`.
    pub fn e_0(&self) -> f64 {
        self.s_c0() / self.elastic_modulus
    }

    /// Tensile strain at the ultimate tensile stress, `e_t0 = S_tu / E`.
    pub fn e_t0(&self) -> f64 {
        self.s_tu / self.elastic_modulus
    }
}

/// Free shape parameters of the compression softening law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionShape {
    /// Weibull shape exponent.
    pub alpha: f64,
    /// Characteristic softening strain (`e_63`, also written `e_60`).
    pub e_63: f64,
}

/// Free shape parameters of the tension softening law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TensionShape {
    /// Power-law exponent.
    pub beta: f64,
    /// Terminal strain where the tensile stress reaches zero.
    pub e_end: f64,
}

/// One sample of a generated curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub strain: f64,
    pub stress: f64,
    pub segment: Segment,
}

/// Generated envelope curve for one loading direction.
///
/// Strain is strictly increasing and stress is continuous across segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressStrainCurve {
    pub loading: Loading,
    pub points: Vec<CurvePoint>,
}

impl StressStrainCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points belonging to the given segment, in strain order.
    pub fn segment(&self, segment: Segment) -> impl Iterator<Item = &CurvePoint> {
        self.points.iter().filter(move |p| p.segment == segment)
    }

    /// `(strain, stress)` pairs, used by the dump writer and the plotter.
    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.strain, p.stress)).collect()
    }
}

/// One measured sample of a target curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetPoint {
    pub strain: f64,
    pub stress: f64,
}

/// Measured stress–strain samples used as the calibration target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetCurve {
    points: Vec<TargetPoint>,
}

impl TargetCurve {
    /// Validate and wrap target samples.
    ///
    /// Requires at least two samples, finite values, strictly increasing
    /// strain and non-negative stress.
    pub fn new(points: Vec<TargetPoint>) -> Result<Self, AppError> {
        if points.len() < 2 {
            return Err(AppError::InvalidInput(format!(
                "Target curve needs at least 2 samples, got {}.",
                points.len()
            )));
        }
        for (i, p) in points.iter().enumerate() {
            if !(p.strain.is_finite() && p.stress.is_finite()) {
                return Err(AppError::InvalidInput(format!(
                    "Target sample {} is not finite (strain={}, stress={}).",
                    i + 1,
                    p.strain,
                    p.stress
                )));
            }
            if p.stress < 0.0 {
                return Err(AppError::InvalidInput(format!(
                    "Target sample {} has negative stress {}.",
                    i + 1,
                    p.stress
                )));
            }
        }
        for (i, w) in points.windows(2).enumerate() {
            if w[1].strain <= w[0].strain {
                return Err(AppError::InvalidInput(format!(
                    "Target strain must be strictly increasing (sample {}: {} after {}).",
                    i + 2,
                    w[1].strain,
                    w[0].strain
                )));
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[TargetPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn strains(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.strain).collect()
    }

    pub fn stresses(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.stress).collect()
    }

    /// Largest sampled strain (the last sample, since strain is increasing).
    pub fn max_strain(&self) -> f64 {
        self.points[self.points.len() - 1].strain
    }
}

/// Point counts per segment.
///
/// Elastic and hardening ranges exclude their end point so that consecutive
/// segments never repeat a strain; softening ranges include it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingPolicy {
    pub compression_elastic: usize,
    pub compression_hardening: usize,
    pub compression_softening: usize,
    pub tension_elastic: usize,
    pub tension_softening: usize,
}

impl SamplingPolicy {
    /// Dense sampling used when emitting material cards.
    pub const GENERATION: SamplingPolicy = SamplingPolicy {
        compression_elastic: 20,
        compression_hardening: 20,
        compression_softening: 50,
        tension_elastic: 20,
        tension_softening: 50,
    };

    /// Sparse sampling used for calibration previews.
    pub const CALIBRATION: SamplingPolicy = SamplingPolicy {
        compression_elastic: 5,
        compression_hardening: 5,
        compression_softening: 20,
        tension_elastic: 5,
        tension_softening: 20,
    };
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self::GENERATION
    }
}

/// Axis-aligned box for a pair of shape parameters.
///
/// Index 0 is the exponent (`alpha` / `beta`), index 1 the strain
/// (`e_63` / `e_end`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterBounds {
    pub lower: [f64; 2],
    pub upper: [f64; 2],
}

impl ParameterBounds {
    pub fn new(exponent: (f64, f64), strain: (f64, f64)) -> Self {
        Self {
            lower: [exponent.0, strain.0],
            upper: [exponent.1, strain.1],
        }
    }

    /// Default compression box: `alpha ∈ [0.5, 8]`, `e_63 ∈ [1e-4, 1e-2]`.
    pub fn compression_default() -> Self {
        Self::new((0.5, 8.0), (1e-4, 1e-2))
    }

    /// Default tension box: `beta ∈ [1, 5]`, `e_end` within ±10% of the
    /// largest target strain.
    pub fn tension_default(max_target_strain: f64) -> Self {
        Self::new((1.0, 5.0), (0.9 * max_target_strain, 1.1 * max_target_strain))
    }

    /// Width of the box along each axis.
    pub fn span(&self) -> [f64; 2] {
        [self.upper[0] - self.lower[0], self.upper[1] - self.lower[1]]
    }

    pub fn validate(&self, label: &str) -> Result<(), AppError> {
        for axis in 0..2 {
            let (lo, hi) = (self.lower[axis], self.upper[axis]);
            if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && hi > lo) {
                return Err(AppError::InvalidParameterRange(format!(
                    "{label} bounds on axis {axis} must be finite with 0 < lower < upper (got [{lo}, {hi}])."
                )));
            }
        }
        Ok(())
    }
}

/// Damage-plasticity table row: `(damage, decomposed strain)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamagePoint {
    pub damage: f64,
    pub strain: f64,
}

/// Hardening / stiffening table row: `(stress, decomposed strain)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HardeningPoint {
    pub stress: f64,
    pub strain: f64,
}

/// How the tension tables express post-cracking deformation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TensionMeasure {
    /// Cracking strain.
    Strain,
    /// Cracking displacement = cracking strain × reference length.
    Displacement { reference_length: f64 },
}

impl TensionMeasure {
    pub fn from_reference_length(reference_length: Option<f64>) -> Self {
        match reference_length {
            Some(reference_length) => TensionMeasure::Displacement { reference_length },
            None => TensionMeasure::Strain,
        }
    }

    pub fn scale(self) -> f64 {
        match self {
            TensionMeasure::Strain => 1.0,
            TensionMeasure::Displacement { reference_length } => reference_length,
        }
    }
}

/// Flow potential line of the CDP directive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowPotential {
    /// Dilation angle (degrees).
    pub dilation_angle: f64,
    pub eccentricity: f64,
    /// Ratio of biaxial to uniaxial compressive strength.
    pub fb0_fc0: f64,
    /// Ratio of tensile to compressive meridian second invariant.
    pub k: f64,
    pub viscosity: f64,
}

impl Default for FlowPotential {
    fn default() -> Self {
        Self {
            dilation_angle: 40.0,
            eccentricity: 0.1,
            fb0_fc0: 1.16,
            k: 0.66667,
            viscosity: 0.001,
        }
    }
}

/// Scalar options of the CDP material card that do not affect the curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CdpOptions {
    /// Density in tonne/mm³ (rescaled for `UnitSystem::Metre`).
    pub density: f64,
    pub poisson: f64,
    pub flow: FlowPotential,
    /// Tension stiffness recovery `w_t`, written on the compression damage line.
    pub tension_recovery: f64,
    /// Compression stiffness recovery `w_c`, written on the tension damage line.
    pub compression_recovery: f64,
    pub tension_measure: TensionMeasure,
    pub units: UnitSystem,
}

impl Default for CdpOptions {
    fn default() -> Self {
        Self {
            density: 2.4e-9,
            poisson: 0.2,
            flow: FlowPotential::default(),
            tension_recovery: 1.0,
            compression_recovery: 0.0,
            tension_measure: TensionMeasure::Displacement {
                reference_length: 1.0,
            },
            units: UnitSystem::Millimetre,
        }
    }
}

/// Search budget for the calibrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Uniform random draws used to seed the local search.
    pub samples: usize,
    /// Iteration cap of the simplex refinement.
    pub max_iterations: usize,
    /// Simplex size tolerance in normalized box coordinates.
    pub x_tol: f64,
    /// Objective spread tolerance (absolute, plus the same value relative).
    pub f_tol: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            samples: 1000,
            max_iterations: 20_000,
            x_tol: 1e-8,
            f_tol: 1e-10,
        }
    }
}

/// A full generation run as understood by the pipeline.
///
/// This is derived from CLI flags (or a calibration file) plus defaults.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub material: MaterialParameters,
    pub compression: CompressionShape,
    pub tension: TensionShape,
    pub cdp: CdpOptions,
    pub sampling: SamplingPolicy,

    pub output_dir: Option<PathBuf>,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

/// A full calibration run as understood by the pipeline.
#[derive(Debug, Clone)]
pub struct CalibrationConfig {
    pub material: MaterialParameters,

    pub compression_target: Option<PathBuf>,
    pub tension_target: Option<PathBuf>,

    pub compression_bounds: ParameterBounds,
    /// Bounds on `beta`.
    pub tension_exponent_bounds: (f64, f64),
    /// Bounds on `e_end`; `None` spans ±10% around the largest tension target strain.
    pub tension_end_bounds: Option<(f64, f64)>,

    pub search: SearchOptions,
    pub seed: u64,

    pub output_dir: Option<PathBuf>,
    pub export_fit: Option<PathBuf>,
    /// Print the target-vs-fit residual table per loading direction.
    pub show_residuals: bool,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl CalibrationConfig {
    /// Resolve the tension bounds box once the target curve is known.
    pub fn tension_bounds(&self, max_target_strain: f64) -> ParameterBounds {
        let default = ParameterBounds::tension_default(max_target_strain);
        let e_end = self
            .tension_end_bounds
            .unwrap_or((default.lower[1], default.upper[1]));
        ParameterBounds::new(self.tension_exponent_bounds, e_end)
    }
}
