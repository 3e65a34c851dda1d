//! Monotone piecewise cubic Hermite interpolation (PCHIP).
//!
//! Node derivatives follow Fritsch–Butland:
//!
//! - interior nodes use a weighted harmonic mean of the adjacent secant
//!   slopes, and are set to zero at local extrema (sign change or flat secant)
//! - end nodes use a one-sided three-point estimate, clamped so the
//!   interpolant cannot overshoot the data
//!
//! The interpolant passes exactly through every sample and is monotone on each
//! interval where the data is monotone. Outside the sample range the first or
//! last cubic is extended.

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Pchip {
    x: Vec<f64>,
    y: Vec<f64>,
    d: Vec<f64>,
}

impl Pchip {
    /// Build the interpolant. `x` must be strictly increasing with `len >= 2`.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, AppError> {
        if x.len() != y.len() {
            return Err(AppError::InvalidInput(format!(
                "Interpolation abscissa/ordinate length mismatch ({} vs {}).",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(AppError::InvalidInput(
                "Interpolation needs at least 2 samples.".to_string(),
            ));
        }
        if x.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(AppError::InvalidInput(
                "Interpolation abscissa must be strictly increasing.".to_string(),
            ));
        }

        let d = node_derivatives(x, y);
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            d,
        })
    }

    /// Evaluate the interpolant at `xq`.
    pub fn eval(&self, xq: f64) -> f64 {
        let n = self.x.len();
        let i = self.x.partition_point(|&v| v <= xq).saturating_sub(1).min(n - 2);

        let h = self.x[i + 1] - self.x[i];
        let t = (xq - self.x[i]) / h;
        let t2 = t * t;
        let one_t = 1.0 - t;

        let h00 = (1.0 + 2.0 * t) * one_t * one_t;
        let h10 = t * one_t * one_t;
        let h01 = t2 * (3.0 - 2.0 * t);
        let h11 = t2 * (t - 1.0);

        h00 * self.y[i] + h10 * h * self.d[i] + h01 * self.y[i + 1] + h11 * h * self.d[i + 1]
    }

    /// Node derivatives (exposed for diagnostics and tests).
    pub fn derivatives(&self) -> &[f64] {
        &self.d
    }
}

fn node_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let m: Vec<f64> = (0..n - 1).map(|k| (y[k + 1] - y[k]) / h[k]).collect();

    if n == 2 {
        return vec![m[0], m[0]];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        let (m0, m1) = (m[k - 1], m[k]);
        if sign(m0) != sign(m1) || m0 == 0.0 || m1 == 0.0 {
            continue;
        }
        let w1 = 2.0 * h[k] + h[k - 1];
        let w2 = h[k] + 2.0 * h[k - 1];
        let harmonic = (w1 / m0 + w2 / m1) / (w1 + w2);
        d[k] = 1.0 / harmonic;
    }

    d[0] = edge_derivative(h[0], h[1], m[0], m[1]);
    d[n - 1] = edge_derivative(h[n - 2], h[n - 3], m[n - 2], m[n - 3]);
    d
}

/// One-sided three-point derivative at an end node, shape-preserving.
fn edge_derivative(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if sign(d) != sign(m0) {
        0.0
    } else if sign(m0) != sign(m1) && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_samples() {
        let x = [0.0, 0.001, 0.002, 0.004, 0.007];
        let y = [0.0, 20.0, 26.0, 12.0, 3.0];
        let p = Pchip::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert!((p.eval(*xi) - yi).abs() < 1e-12, "at {xi}");
        }
    }

    #[test]
    fn preserves_monotonicity_between_samples() {
        // Decreasing data must give a non-increasing interpolant (no overshoot).
        let x = [0.0, 1.0, 2.0, 3.0, 10.0];
        let y = [10.0, 9.0, 2.0, 1.9, 0.0];
        let p = Pchip::new(&x, &y).unwrap();
        let mut prev = p.eval(0.0);
        for i in 1..=1000 {
            let v = p.eval(i as f64 * 0.01);
            assert!(v <= prev + 1e-12, "increase at {}", i as f64 * 0.01);
            prev = v;
        }
    }

    #[test]
    fn local_extremum_has_zero_slope() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 1.0, 0.0];
        let p = Pchip::new(&x, &y).unwrap();
        assert_eq!(p.derivatives()[1], 0.0);
        assert!(p.eval(0.5) <= 1.0);
    }

    #[test]
    fn two_samples_interpolate_linearly() {
        let p = Pchip::new(&[0.0, 2.0], &[1.0, 5.0]).unwrap();
        assert!((p.eval(1.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn reproduces_linear_data_exactly() {
        let x = [0.0, 0.5, 1.5, 3.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let p = Pchip::new(&x, &y).unwrap();
        assert!((p.eval(2.2) - 5.4).abs() < 1e-12);
    }
}
