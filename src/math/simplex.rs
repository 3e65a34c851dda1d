//! Bounded Nelder–Mead simplex minimization in two dimensions.
//!
//! Standard coefficients (reflection 1, expansion 2, contraction ½, shrink ½).
//! Every trial vertex is clipped into the box `[lower, upper]`, which keeps
//! the objective inside its domain without needing gradients or penalties.
//!
//! The search stops when both the simplex extent (max-norm distance of every
//! vertex to the best one) and the objective spread fall below their
//! tolerances, or when the iteration cap is reached. Hitting the cap is
//! reported through `converged = false`; the best vertex is still returned.

use nalgebra::Vector2;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Initial simplex edge as a fraction of the box width on each axis.
const INITIAL_STEP: f64 = 0.05;

#[derive(Debug, Clone, Copy)]
pub struct SimplexOptions {
    pub max_iterations: usize,
    /// Vertex-spread tolerance (same units as the search space).
    pub x_tol: f64,
    /// Objective-spread tolerance, applied as `f_tol * (1 + |f_best|)`.
    pub f_tol: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SimplexOutcome {
    pub point: Vector2<f64>,
    pub value: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

/// Minimize `f` inside the box starting from `start`.
///
/// Non-finite objective values are treated as `+∞` so that the simplex moves
/// away from them.
pub fn minimize_bounded<F>(
    f: F,
    start: Vector2<f64>,
    lower: Vector2<f64>,
    upper: Vector2<f64>,
    opts: &SimplexOptions,
) -> SimplexOutcome
where
    F: Fn(&Vector2<f64>) -> f64,
{
    let clip = |v: Vector2<f64>| -> Vector2<f64> {
        Vector2::new(v[0].clamp(lower[0], upper[0]), v[1].clamp(lower[1], upper[1]))
    };
    let mut evaluations = 0usize;
    let mut eval = |v: &Vector2<f64>| -> f64 {
        evaluations += 1;
        let y = f(v);
        if y.is_finite() { y } else { f64::INFINITY }
    };

    let x0 = clip(start);
    let mut sim: [Vector2<f64>; 3] = [x0, x0, x0];
    for axis in 0..2 {
        let step = INITIAL_STEP * (upper[axis] - lower[axis]);
        let mut v = x0;
        v[axis] = if x0[axis] + step <= upper[axis] {
            x0[axis] + step
        } else {
            x0[axis] - step
        };
        sim[axis + 1] = clip(v);
    }
    let mut fvals = [eval(&sim[0]), eval(&sim[1]), eval(&sim[2])];

    let mut iterations = 0usize;
    let mut converged = false;

    loop {
        sort_simplex(&mut sim, &mut fvals);

        let x_spread = (sim[1] - sim[0]).amax().max((sim[2] - sim[0]).amax());
        let f_spread = (fvals[1] - fvals[0]).abs().max((fvals[2] - fvals[0]).abs());
        if x_spread <= opts.x_tol && f_spread <= opts.f_tol * (1.0 + fvals[0].abs()) {
            converged = true;
            break;
        }
        if iterations >= opts.max_iterations {
            break;
        }
        iterations += 1;

        let centroid = (sim[0] + sim[1]) * 0.5;
        let worst = sim[2];

        let xr = clip(centroid + (centroid - worst) * REFLECTION);
        let fr = eval(&xr);

        if fr < fvals[0] {
            let xe = clip(centroid + (xr - centroid) * EXPANSION);
            let fe = eval(&xe);
            if fe < fr {
                sim[2] = xe;
                fvals[2] = fe;
            } else {
                sim[2] = xr;
                fvals[2] = fr;
            }
            continue;
        }

        if fr < fvals[1] {
            sim[2] = xr;
            fvals[2] = fr;
            continue;
        }

        let accepted = if fr < fvals[2] {
            // Outside contraction.
            let xc = clip(centroid + (xr - centroid) * CONTRACTION);
            let fc = eval(&xc);
            if fc <= fr {
                sim[2] = xc;
                fvals[2] = fc;
                true
            } else {
                false
            }
        } else {
            // Inside contraction.
            let xcc = clip(centroid + (worst - centroid) * CONTRACTION);
            let fcc = eval(&xcc);
            if fcc < fvals[2] {
                sim[2] = xcc;
                fvals[2] = fcc;
                true
            } else {
                false
            }
        };

        if !accepted {
            for j in 1..3 {
                sim[j] = clip(sim[0] + (sim[j] - sim[0]) * SHRINK);
                fvals[j] = eval(&sim[j]);
            }
        }
    }

    SimplexOutcome {
        point: sim[0],
        value: fvals[0],
        iterations,
        evaluations,
        converged,
    }
}

/// Order vertices by objective value; ties keep their current order.
fn sort_simplex(sim: &mut [Vector2<f64>; 3], fvals: &mut [f64; 3]) {
    let mut idx = [0usize, 1, 2];
    idx.sort_by(|&a, &b| fvals[a].partial_cmp(&fvals[b]).unwrap_or(std::cmp::Ordering::Equal));
    let s = *sim;
    let f = *fvals;
    for (k, &i) in idx.iter().enumerate() {
        sim[k] = s[i];
        fvals[k] = f[i];
    }
}
