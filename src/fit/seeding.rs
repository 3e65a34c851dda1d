//! Global random seeding for the local simplex search.
//!
//! The softening objectives are non-convex in their two shape parameters, so
//! a local search started from an arbitrary corner can stall in a poor basin.
//! We draw a fixed number of uniform candidates inside the bounds box,
//! evaluate them in parallel and start the simplex at the best one.
//!
//! Reproducibility:
//! - candidates are drawn sequentially from the caller's RNG (all first-axis
//!   values, then all second-axis values)
//! - evaluation order does not matter: the reduction is a deterministic argmin
//!   with ties broken by draw index

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use rayon::prelude::*;

use crate::domain::ParameterBounds;
use crate::error::AppError;

/// A sampled parameter pair and its objective value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedCandidate {
    pub idx: usize,
    pub params: [f64; 2],
    pub objective: f64,
}

/// Draw `n` uniform points inside `bounds`.
pub fn draw_uniform_box<R: Rng + ?Sized>(
    bounds: &ParameterBounds,
    n: usize,
    rng: &mut R,
) -> Result<Vec<[f64; 2]>, AppError> {
    if n == 0 {
        return Err(AppError::InvalidInput("Seed sample count must be > 0.".to_string()));
    }
    bounds.validate("seeding")?;

    let first = Uniform::new(bounds.lower[0], bounds.upper[0]);
    let second = Uniform::new(bounds.lower[1], bounds.upper[1]);

    let a: Vec<f64> = (0..n).map(|_| first.sample(&mut *rng)).collect();
    let b: Vec<f64> = (0..n).map(|_| second.sample(&mut *rng)).collect();

    Ok(a.into_iter().zip(b).map(|(x, y)| [x, y]).collect())
}

/// Evaluate every candidate (parallel) and return the minimum.
///
/// Candidates with a non-finite objective are skipped; `None` means every
/// candidate was rejected.
pub fn best_candidate<F>(candidates: &[[f64; 2]], objective: F) -> Option<SeedCandidate>
where
    F: Fn(&[f64; 2]) -> f64 + Sync,
{
    let evaluated: Vec<SeedCandidate> = candidates
        .par_iter()
        .enumerate()
        .filter_map(|(idx, params)| {
            let value = objective(params);
            value.is_finite().then_some(SeedCandidate {
                idx,
                params: *params,
                objective: value,
            })
        })
        .collect();

    let mut iter = evaluated.iter();
    let mut best = iter.next()?;
    for c in iter {
        if c.objective < best.objective || (c.objective == best.objective && c.idx < best.idx) {
            best = c;
        }
    }
    Some(*best)
}
