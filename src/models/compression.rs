//! Compression envelope: linear elastic → parabolic hardening → Weibull softening.
//!
//! With `E`, `S_cu`, `e_cu` given, the parabola is fixed by four conditions:
//! value `S_c0` and slope `E` at `e_0`, value `S_cu` and zero slope at `e_cu`.
//! That forces `S_c0 = 2·S_cu − E·e_cu` and `e_0 = S_c0 / E`, which is only
//! admissible for `S_cu/E < e_cu < 2·S_cu/E`.
//!
//! Softening decays from `S_cu` towards a residual floor of `0.01·S_cu` and
//! never reaches it, so compression damage stays strictly below 1.

use crate::domain::{
    COMPRESSION_DECAY_AMPLITUDE, COMPRESSION_RESIDUAL, CompressionShape, CurvePoint, Loading,
    MaterialParameters, SamplingPolicy, Segment, StressStrainCurve,
};
use crate::error::AppError;
use crate::math::lin_space;

/// Decay (relative to `S_cu`, above the floor) at which softening sampling stops.
const SOFTENING_CUTOFF: f64 = 0.001;

/// Check the material parameters and the hardening-start window.
pub fn validate_material(m: &MaterialParameters) -> Result<(), AppError> {
    let named = [
        ("Elastic modulus E", m.elastic_modulus),
        ("Compressive ultimate stress S_cu", m.s_cu),
        ("Ultimate crushing strain e_cu", m.e_cu),
        ("Tensile ultimate stress S_tu", m.s_tu),
    ];
    for (name, value) in named {
        if !(value.is_finite() && value > 0.0) {
            return Err(AppError::InvalidParameterRange(format!(
                "{name} must be finite and > 0 (got {value})."
            )));
        }
    }

    let lo = m.s_cu / m.elastic_modulus;
    let hi = 2.0 * m.s_cu / m.elastic_modulus;
    if m.e_cu <= lo || m.e_cu >= hi {
        return Err(AppError::InvalidParameterRange(format!(
            "Ultimate crushing strain e_cu={} should be in the range ({lo} ~ {hi}).",
            m.e_cu
        )));
    }
    Ok(())
}

pub fn validate_shape(shape: &CompressionShape) -> Result<(), AppError> {
    if !(shape.alpha.is_finite() && shape.alpha > 0.0) {
        return Err(AppError::InvalidParameterRange(format!(
            "Softening exponent Alpha must be finite and > 0 (got {}).",
            shape.alpha
        )));
    }
    if !(shape.e_63.is_finite() && shape.e_63 > 0.0) {
        return Err(AppError::InvalidParameterRange(format!(
            "Softening strain e_63 must be finite and > 0 (got {}).",
            shape.e_63
        )));
    }
    Ok(())
}

/// Parabolic hardening stress for `e_0 <= strain <= e_cu`.
pub fn hardening_stress(m: &MaterialParameters, strain: f64) -> f64 {
    let s_c0 = m.s_c0();
    let e_0 = m.e_0();
    let span = m.e_cu - e_0;
    let k = (m.s_cu - s_c0) / (span * span);
    -k * (strain - e_0) * (strain - e_0 - 2.0 * span) + s_c0
}

/// Weibull softening stress for `strain >= e_cu`.
///
/// Returns `S_cu` exactly at (and before) the peak.
pub fn softening_stress(m: &MaterialParameters, shape: &CompressionShape, strain: f64) -> f64 {
    let x = strain - m.e_cu;
    if x <= 0.0 {
        return m.s_cu;
    }
    let decay = (-(x / shape.e_63).powf(shape.alpha)).exp();
    m.s_cu * (COMPRESSION_DECAY_AMPLITUDE * decay + COMPRESSION_RESIDUAL)
}

/// Full compression envelope at an arbitrary strain.
pub fn compression_stress(m: &MaterialParameters, shape: &CompressionShape, strain: f64) -> f64 {
    if strain < m.e_0() {
        m.elastic_modulus * strain
    } else if strain < m.e_cu {
        hardening_stress(m, strain)
    } else {
        softening_stress(m, shape, strain)
    }
}

/// Strain at which softening has decayed to 0.1% of `S_cu` above the floor.
pub fn softening_end_strain(m: &MaterialParameters, shape: &CompressionShape) -> f64 {
    let ln_ratio = -(SOFTENING_CUTOFF / COMPRESSION_DECAY_AMPLITUDE).ln();
    m.e_cu + shape.e_63 * ln_ratio.powf(1.0 / shape.alpha)
}

/// Sample the compression envelope.
///
/// `softening_end = None` samples softening up to [`softening_end_strain`];
/// calibration previews pass the largest target strain instead.
pub fn compression_curve(
    m: &MaterialParameters,
    shape: &CompressionShape,
    sampling: &SamplingPolicy,
    softening_end: Option<f64>,
) -> Result<StressStrainCurve, AppError> {
    validate_material(m)?;
    validate_shape(shape)?;

    let e_0 = m.e_0();
    let end = softening_end.unwrap_or_else(|| softening_end_strain(m, shape));
    if !(end > m.e_cu) {
        return Err(AppError::InvalidParameterRange(format!(
            "Softening range end {end} must exceed e_cu={}.",
            m.e_cu
        )));
    }

    let elastic = lin_space(0.0, e_0, sampling.compression_elastic, false)?;
    let hardening = lin_space(e_0, m.e_cu, sampling.compression_hardening, false)?;
    let softening = lin_space(m.e_cu, end, sampling.compression_softening, true)?;

    let mut points = Vec::with_capacity(elastic.len() + hardening.len() + softening.len());
    points.extend(elastic.into_iter().map(|strain| CurvePoint {
        strain,
        stress: m.elastic_modulus * strain,
        segment: Segment::Elastic,
    }));
    points.extend(hardening.into_iter().map(|strain| CurvePoint {
        strain,
        stress: hardening_stress(m, strain),
        segment: Segment::Hardening,
    }));
    points.extend(softening.into_iter().map(|strain| CurvePoint {
        strain,
        stress: softening_stress(m, shape, strain),
        segment: Segment::Softening,
    }));

    Ok(StressStrainCurve {
        loading: Loading::Compression,
        points,
    })
}
