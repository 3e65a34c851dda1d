//! Reporting utilities: fit residuals and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{CompressionShape, MaterialParameters, TargetCurve, TensionShape};
use crate::models::{compression_stress, tension_stress};

/// Target sample against the fitted envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResidual {
    pub strain: f64,
    pub target: f64,
    pub fitted: f64,
    pub residual: f64,
}

fn residuals(target: &TargetCurve, model: impl Fn(f64) -> f64) -> Vec<FitResidual> {
    target
        .points()
        .iter()
        .map(|p| {
            let fitted = model(p.strain);
            FitResidual {
                strain: p.strain,
                target: p.stress,
                fitted,
                residual: p.stress - fitted,
            }
        })
        .collect()
}

/// Residuals of every target sample against the full compression envelope.
pub fn compression_residuals(
    m: &MaterialParameters,
    shape: &CompressionShape,
    target: &TargetCurve,
) -> Vec<FitResidual> {
    residuals(target, |e| compression_stress(m, shape, e))
}

/// Residuals of every target sample against the full tension envelope.
///
/// Samples beyond `e_end` are compared against zero stress.
pub fn tension_residuals(
    m: &MaterialParameters,
    shape: &TensionShape,
    target: &TargetCurve,
) -> Vec<FitResidual> {
    residuals(target, |e| {
        if e > shape.e_end {
            0.0
        } else {
            tension_stress(m, shape, e)
        }
    })
}

/// Root-mean-square residual (`None` for an empty slice).
pub fn rms(residuals: &[FitResidual]) -> Option<f64> {
    if residuals.is_empty() {
        return None;
    }
    let ss: f64 = residuals.iter().map(|r| r.residual * r.residual).sum();
    Some((ss / residuals.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TargetPoint;

    #[test]
    fn residuals_are_target_minus_fit() {
        let m = MaterialParameters::from_gpa(30.0, 50.0, 0.003, 5.0);
        let shape = CompressionShape { alpha: 2.0, e_63: 0.005 };
        let target = TargetCurve::new(vec![
            TargetPoint { strain: 0.0, stress: 1.0 },
            TargetPoint { strain: 0.003, stress: 48.0 },
        ])
        .unwrap();
        let r = compression_residuals(&m, &shape, &target);
        assert_eq!(r.len(), 2);
        assert!((r[0].residual - 1.0).abs() < 1e-12);
        assert!((r[1].residual + 2.0).abs() < 1e-12);
        let expected = ((1.0 + 4.0) / 2.0_f64).sqrt();
        assert!((rms(&r).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn tension_residuals_past_end_strain_compare_to_zero() {
        let m = MaterialParameters::from_gpa(30.0, 50.0, 0.003, 5.0);
        let shape = TensionShape { beta: 1.2, e_end: 0.002 };
        let target = TargetCurve::new(vec![
            TargetPoint { strain: 0.001, stress: 2.0 },
            TargetPoint { strain: 0.0025, stress: 0.3 },
        ])
        .unwrap();
        let r = tension_residuals(&m, &shape, &target);
        assert_eq!(r[1].fitted, 0.0);
        assert!((r[1].residual - 0.3).abs() < 1e-12);
        assert!(rms(&[]).is_none());
    }
}
