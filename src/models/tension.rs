//! Tension envelope: linear elastic up to `e_t0 = S_tu/E`, then power-law
//! softening that reaches zero stress at `e_end`.

use crate::domain::{
    CurvePoint, Loading, MaterialParameters, SamplingPolicy, Segment, StressStrainCurve,
    TensionShape,
};
use crate::error::AppError;
use crate::math::lin_space;

pub fn validate_shape(m: &MaterialParameters, shape: &TensionShape) -> Result<(), AppError> {
    if !(shape.beta.is_finite() && shape.beta > 0.0) {
        return Err(AppError::InvalidParameterRange(format!(
            "Softening exponent Beta must be finite and > 0 (got {}).",
            shape.beta
        )));
    }
    let e_t0 = m.e_t0();
    if !(shape.e_end.is_finite() && shape.e_end > e_t0) {
        return Err(AppError::InvalidParameterRange(format!(
            "End strain e_end={} should be larger than {e_t0}.",
            shape.e_end
        )));
    }
    Ok(())
}

/// Power-law softening stress for `e_t0 <= strain <= e_end`.
///
/// The base is taken in absolute value: at `strain = e_end` round-off can push
/// it slightly below zero, where a fractional power would be NaN.
pub fn softening_stress(m: &MaterialParameters, shape: &TensionShape, strain: f64) -> f64 {
    let e_t0 = m.e_t0();
    let base = ((shape.e_end - strain) / (shape.e_end - e_t0)).abs();
    m.s_tu * base.powf(shape.beta)
}

/// Full tension envelope at an arbitrary strain.
pub fn tension_stress(m: &MaterialParameters, shape: &TensionShape, strain: f64) -> f64 {
    if strain < m.e_t0() {
        m.elastic_modulus * strain
    } else {
        softening_stress(m, shape, strain)
    }
}

/// Sample the tension envelope on `[0, e_end]`.
pub fn tension_curve(
    m: &MaterialParameters,
    shape: &TensionShape,
    sampling: &SamplingPolicy,
) -> Result<StressStrainCurve, AppError> {
    validate_shape(m, shape)?;

    let e_t0 = m.e_t0();
    let elastic = lin_space(0.0, e_t0, sampling.tension_elastic, false)?;
    let softening = lin_space(e_t0, shape.e_end, sampling.tension_softening, true)?;

    let mut points = Vec::with_capacity(elastic.len() + softening.len());
    points.extend(elastic.into_iter().map(|strain| CurvePoint {
        strain,
        stress: m.elastic_modulus * strain,
        segment: Segment::Elastic,
    }));
    points.extend(softening.into_iter().map(|strain| CurvePoint {
        strain,
        stress: softening_stress(m, shape, strain),
        segment: Segment::Softening,
    }));

    Ok(StressStrainCurve {
        loading: Loading::Tension,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> MaterialParameters {
        MaterialParameters::from_gpa(30.0, 50.0, 0.003, 5.0)
    }

    fn shape() -> TensionShape {
        TensionShape { beta: 1.2, e_end: 0.002 }
    }

    #[test]
    fn worked_example_end_points() {
        let m = material();
        let s = shape();
        assert!((m.e_t0() - 1.6667e-4).abs() < 1e-8);
        assert_eq!(tension_stress(&m, &s, m.e_t0()), 5.0);
        assert!(tension_stress(&m, &s, 0.002).abs() < 1e-12);
    }

    #[test]
    fn softening_strictly_decreasing() {
        let m = material();
        let curve = tension_curve(&m, &shape(), &SamplingPolicy::GENERATION).unwrap();
        let soft: Vec<_> = curve.segment(Segment::Softening).collect();
        assert_eq!(soft.len(), 50);
        assert!(soft.windows(2).all(|w| w[1].stress < w[0].stress));
        assert!(soft[49].stress.abs() < 1e-12);
        assert_eq!(soft[49].strain, 0.002);
    }

    #[test]
    fn elastic_joins_softening_without_duplicate_strain() {
        let m = material();
        let curve = tension_curve(&m, &shape(), &SamplingPolicy::GENERATION).unwrap();
        assert_eq!(curve.len(), 70);
        assert!(curve.points.windows(2).all(|w| w[1].strain > w[0].strain));
        assert_eq!(curve.points[20].strain, m.e_t0());
    }

    #[test]
    fn end_strain_must_exceed_cracking_strain() {
        let m = material();
        let bad = TensionShape { beta: 1.2, e_end: 1.0e-4 };
        let err = tension_curve(&m, &bad, &SamplingPolicy::GENERATION).unwrap_err();
        assert!(matches!(err, AppError::InvalidParameterRange(_)));
    }
}
