//! Map generated envelopes onto concrete-damaged-plasticity tables.
//!
//! - compression: hardening `(σ, ε_in)` and damage `(d_c, ε_in)`
//! - tension: stiffening `(σ, w)` and damage `(d_t, w)`, where `w` is the
//!   cracking strain or, with a reference length, the cracking displacement
//!
//! Damage is `1 − σ/σ_u`, zero up to the ultimate point and clamped to `[0, 1]`.

pub mod card;

pub use card::*;

use crate::domain::{
    DamagePoint, HardeningPoint, MaterialParameters, Segment, StressStrainCurve, TensionMeasure,
};

/// Tension points at or below this fraction of `S_tu` carry no stiffness and are dropped.
pub const TENSION_DROP_FRACTION: f64 = 0.01;

fn damage_ratio(stress: f64, ultimate: f64) -> f64 {
    (1.0 - stress / ultimate).clamp(0.0, 1.0)
}

/// Compression hardening and damage tables.
///
/// Uses the hardening and softening points of `curve`; the elastic part has
/// no inelastic strain.
pub fn compression_tables(
    curve: &StressStrainCurve,
    m: &MaterialParameters,
) -> (Vec<HardeningPoint>, Vec<DamagePoint>) {
    let inelastic = curve
        .points
        .iter()
        .filter(|p| matches!(p.segment, Segment::Hardening | Segment::Softening));

    let mut hardening = Vec::new();
    let mut damage = Vec::new();
    for p in inelastic {
        let strain = p.strain - p.stress / m.elastic_modulus;
        let d = if p.strain <= m.e_cu {
            0.0
        } else {
            damage_ratio(p.stress, m.s_cu)
        };
        hardening.push(HardeningPoint { stress: p.stress, strain });
        damage.push(DamagePoint { damage: d, strain });
    }
    (hardening, damage)
}

/// Tension stiffening and damage tables.
pub fn tension_tables(
    curve: &StressStrainCurve,
    m: &MaterialParameters,
    measure: TensionMeasure,
) -> (Vec<HardeningPoint>, Vec<DamagePoint>) {
    let e_t0 = m.e_t0();
    let floor = TENSION_DROP_FRACTION * m.s_tu;
    let scale = measure.scale();

    let mut stiffening = Vec::new();
    let mut damage = Vec::new();
    for p in curve.segment(Segment::Softening).filter(|p| p.stress > floor) {
        let cracking = (p.strain - p.stress / m.elastic_modulus) * scale;
        let d = if p.strain <= e_t0 {
            0.0
        } else {
            damage_ratio(p.stress, m.s_tu)
        };
        stiffening.push(HardeningPoint {
            stress: p.stress,
            strain: cracking,
        });
        damage.push(DamagePoint {
            damage: d,
            strain: cracking,
        });
    }
    (stiffening, damage)
}
