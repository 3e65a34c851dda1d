//! Two-stage calibration of the softening shape parameters.
//!
//! Given:
//! - material parameters (which fix the elastic and hardening parts)
//! - a measured target curve
//! - a bounds box for the two free shape parameters
//!
//! we:
//! - interpolate the target with a monotone cubic (PCHIP)
//! - keep the target strains past the ultimate point
//! - minimize the squared error between the interpolant and the softening law
//!   at those strains, first by uniform random seeding, then by a bounded
//!   simplex refinement
//!
//! The same routine serves compression `(alpha, e_63)` and tension
//! `(beta, e_end)`; only the objective differs.

use nalgebra::Vector2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{
    CompressionShape, Loading, MaterialParameters, ParameterBounds, SearchOptions, TargetCurve,
    TensionShape,
};
use crate::error::AppError;
use crate::fit::seeding::{best_candidate, draw_uniform_box};
use crate::math::{Pchip, SimplexOptions, minimize_bounded};
use crate::models::{compression, tension};

/// Minimum number of target samples past the ultimate point.
const MIN_RETAINED: usize = 2;

/// Quality notes attached to a usable fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FitWarning {
    /// The simplex hit its iteration cap before meeting the tolerances.
    OptimizerDidNotConverge {
        loading: Loading,
        iterations: usize,
        objective: f64,
    },
}

impl std::fmt::Display for FitWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitWarning::OptimizerDidNotConverge {
                loading,
                iterations,
                objective,
            } => write!(
                f,
                "{} fit did not converge after {iterations} iterations (objective={objective:.6e}); fit quality may be poor.",
                loading.display_name()
            ),
        }
    }
}

/// Search diagnostics for one fitted loading direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    /// Objective at the best random seed.
    pub seed_objective: f64,
    /// Objective at the refined parameters.
    pub objective: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
    /// Target samples past the ultimate point that entered the objective.
    pub retained_samples: usize,
    pub seed_samples: usize,
}

impl FitDiagnostics {
    pub fn warning(&self, loading: Loading) -> Option<FitWarning> {
        (!self.converged).then_some(FitWarning::OptimizerDidNotConverge {
            loading,
            iterations: self.iterations,
            objective: self.objective,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionFit {
    pub shape: CompressionShape,
    pub bounds: ParameterBounds,
    pub diagnostics: FitDiagnostics,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TensionFit {
    pub shape: TensionShape,
    pub bounds: ParameterBounds,
    pub diagnostics: FitDiagnostics,
}

/// Interpolated target values at the strains the softening law controls.
#[derive(Debug, Clone)]
pub struct SofteningTarget {
    pub strains: Vec<f64>,
    pub stresses: Vec<f64>,
}

impl SofteningTarget {
    /// Interpolate `target` and keep samples with `strain > cutoff`.
    pub fn new(target: &TargetCurve, cutoff: f64, loading: Loading) -> Result<Self, AppError> {
        let spline = Pchip::new(&target.strains(), &target.stresses())?;
        let strains: Vec<f64> = target
            .points()
            .iter()
            .map(|p| p.strain)
            .filter(|&e| e > cutoff)
            .collect();
        if strains.len() < MIN_RETAINED {
            return Err(AppError::InsufficientTargetData(format!(
                "{} target has {} sample(s) beyond the ultimate strain {cutoff}; at least {MIN_RETAINED} are needed to fit the softening law.",
                loading.display_name(),
                strains.len()
            )));
        }
        let stresses = strains.iter().map(|&e| spline.eval(e)).collect();
        Ok(Self { strains, stresses })
    }

    pub fn len(&self) -> usize {
        self.strains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strains.is_empty()
    }

    /// Sum of squared differences against `model(strain)`.
    pub fn sse(&self, model: impl Fn(f64) -> f64) -> f64 {
        self.strains
            .iter()
            .zip(&self.stresses)
            .map(|(&e, &s)| {
                let r = s - model(e);
                r * r
            })
            .sum()
    }
}

/// Compression objective for a candidate `[alpha, e_63]`.
pub fn compression_objective(m: &MaterialParameters, target: &SofteningTarget, params: &[f64; 2]) -> f64 {
    let shape = CompressionShape {
        alpha: params[0],
        e_63: params[1],
    };
    target.sse(|e| compression::softening_stress(m, &shape, e))
}

/// Tension objective for a candidate `[beta, e_end]`.
pub fn tension_objective(m: &MaterialParameters, target: &SofteningTarget, params: &[f64; 2]) -> f64 {
    let shape = TensionShape {
        beta: params[0],
        e_end: params[1],
    };
    target.sse(|e| tension::softening_stress(m, &shape, e))
}

/// Fit `(alpha, e_63)` to a compression target.
pub fn calibrate_compression<R: Rng + ?Sized>(
    m: &MaterialParameters,
    target: &TargetCurve,
    bounds: &ParameterBounds,
    search: &SearchOptions,
    rng: &mut R,
) -> Result<CompressionFit, AppError> {
    compression::validate_material(m)?;
    bounds.validate("Compression")?;

    let softening = SofteningTarget::new(target, m.e_cu, Loading::Compression)?;
    let (params, diagnostics) = calibrate_pair(Loading::Compression, bounds, search, rng, |p| {
        compression_objective(m, &softening, p)
    })?;
    diagnostics_log(Loading::Compression, &params, &diagnostics);

    Ok(CompressionFit {
        shape: CompressionShape {
            alpha: params[0],
            e_63: params[1],
        },
        bounds: *bounds,
        diagnostics: FitDiagnostics {
            retained_samples: softening.len(),
            ..diagnostics
        },
    })
}

/// Fit `(beta, e_end)` to a tension target.
pub fn calibrate_tension<R: Rng + ?Sized>(
    m: &MaterialParameters,
    target: &TargetCurve,
    bounds: &ParameterBounds,
    search: &SearchOptions,
    rng: &mut R,
) -> Result<TensionFit, AppError> {
    compression::validate_material(m)?;
    bounds.validate("Tension")?;
    let e_t0 = m.e_t0();
    if bounds.lower[1] <= e_t0 {
        return Err(AppError::InvalidParameterRange(format!(
            "Tension e_end lower bound {} should be larger than {e_t0}.",
            bounds.lower[1]
        )));
    }

    let softening = SofteningTarget::new(target, e_t0, Loading::Tension)?;
    let (params, diagnostics) = calibrate_pair(Loading::Tension, bounds, search, rng, |p| {
        tension_objective(m, &softening, p)
    })?;
    diagnostics_log(Loading::Tension, &params, &diagnostics);

    Ok(TensionFit {
        shape: TensionShape {
            beta: params[0],
            e_end: params[1],
        },
        bounds: *bounds,
        diagnostics: FitDiagnostics {
            retained_samples: softening.len(),
            ..diagnostics
        },
    })
}

/// Random seeding followed by simplex refinement in normalized coordinates.
///
/// The simplex runs on the unit square mapped affinely onto `bounds`, so the
/// size tolerance means the same thing for an exponent of order 1 and a strain
/// of order 1e-3.
fn calibrate_pair<R, F>(
    loading: Loading,
    bounds: &ParameterBounds,
    search: &SearchOptions,
    rng: &mut R,
    objective: F,
) -> Result<([f64; 2], FitDiagnostics), AppError>
where
    R: Rng + ?Sized,
    F: Fn(&[f64; 2]) -> f64 + Sync,
{
    let candidates = draw_uniform_box(bounds, search.samples, rng)?;
    let seed = best_candidate(&candidates, &objective).ok_or_else(|| {
        AppError::InsufficientTargetData(format!(
            "{} objective is not finite anywhere inside the bounds box.",
            loading.display_name()
        ))
    })?;
    tracing::debug!(
        loading = loading.display_name(),
        seed_index = seed.idx,
        p0 = seed.params[0],
        p1 = seed.params[1],
        objective = seed.objective,
        "best random seed"
    );

    let span = bounds.span();
    let to_params = |u: &Vector2<f64>| -> [f64; 2] {
        [
            bounds.lower[0] + u[0] * span[0],
            bounds.lower[1] + u[1] * span[1],
        ]
    };
    let start = Vector2::new(
        (seed.params[0] - bounds.lower[0]) / span[0],
        (seed.params[1] - bounds.lower[1]) / span[1],
    );

    let opts = SimplexOptions {
        max_iterations: search.max_iterations,
        x_tol: search.x_tol,
        f_tol: search.f_tol,
    };
    let outcome = minimize_bounded(
        |u| objective(&to_params(u)),
        start,
        Vector2::zeros(),
        Vector2::new(1.0, 1.0),
        &opts,
    );

    // The simplex starts at the seed, so it can only improve on it; keep the
    // seed anyway if clipping ever made the refined point worse.
    let (params, value) = if outcome.value <= seed.objective {
        (to_params(&outcome.point), outcome.value)
    } else {
        (seed.params, seed.objective)
    };

    Ok((
        params,
        FitDiagnostics {
            seed_objective: seed.objective,
            objective: value,
            iterations: outcome.iterations,
            evaluations: outcome.evaluations + candidates.len(),
            converged: outcome.converged,
            retained_samples: 0,
            seed_samples: candidates.len(),
        },
    ))
}

fn diagnostics_log(loading: Loading, params: &[f64; 2], d: &FitDiagnostics) {
    if let Some(warning) = d.warning(loading) {
        tracing::warn!("{warning}");
    }
    tracing::info!(
        loading = loading.display_name(),
        p0 = params[0],
        p1 = params[1],
        objective = d.objective,
        iterations = d.iterations,
        converged = d.converged,
        "calibration finished"
    );
}
