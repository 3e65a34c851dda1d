//! Assembled CDP material card, in the unit system it will be written in.

use serde::Serialize;

use crate::domain::{
    CdpOptions, CompressionShape, DamagePoint, FlowPotential, HardeningPoint, MaterialParameters,
    StressStrainCurve, TensionMeasure, TensionShape, UnitSystem,
};
use crate::damage::{compression_tables, tension_tables};

/// Everything the `.inp` writer needs, already rescaled to `units`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialCard {
    pub units: UnitSystem,
    /// Material and shape parameters as given (MPa); echoed in the header comment.
    pub material: MaterialParameters,
    pub compression_shape: CompressionShape,
    pub tension_shape: TensionShape,

    pub elastic_modulus: f64,
    pub density: f64,
    pub poisson: f64,
    pub flow: FlowPotential,
    pub tension_recovery: f64,
    pub compression_recovery: f64,
    pub tension_measure: TensionMeasure,

    pub compression_hardening: Vec<HardeningPoint>,
    pub compression_damage: Vec<DamagePoint>,
    pub tension_stiffening: Vec<HardeningPoint>,
    pub tension_damage: Vec<DamagePoint>,
}

/// Build the card from both envelopes.
///
/// Tables are computed in MPa and then every stress (tables, modulus) is
/// scaled by `units.stress_scale()`; strains and damage are unit-free.
pub fn build_material_card(
    m: &MaterialParameters,
    compression_shape: &CompressionShape,
    tension_shape: &TensionShape,
    compression: &StressStrainCurve,
    tension: &StressStrainCurve,
    options: &CdpOptions,
) -> MaterialCard {
    let (mut compression_hardening, compression_damage) = compression_tables(compression, m);
    let (mut tension_stiffening, tension_damage) =
        tension_tables(tension, m, options.tension_measure);

    let stress_scale = options.units.stress_scale();
    for row in compression_hardening
        .iter_mut()
        .chain(tension_stiffening.iter_mut())
    {
        row.stress *= stress_scale;
    }

    MaterialCard {
        units: options.units,
        material: *m,
        compression_shape: *compression_shape,
        tension_shape: *tension_shape,
        elastic_modulus: m.elastic_modulus * stress_scale,
        density: options.density * options.units.density_scale(),
        poisson: options.poisson,
        flow: options.flow,
        tension_recovery: options.tension_recovery,
        compression_recovery: options.compression_recovery,
        tension_measure: options.tension_measure,
        compression_hardening,
        compression_damage,
        tension_stiffening,
        tension_damage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SamplingPolicy;
    use crate::models::{compression_curve, tension_curve};

    fn card(units: UnitSystem) -> MaterialCard {
        let m = MaterialParameters::from_gpa(30.0, 50.0, 0.003, 5.0);
        let cs = CompressionShape { alpha: 2.0, e_63: 0.005 };
        let ts = TensionShape { beta: 1.2, e_end: 0.002 };
        let c = compression_curve(&m, &cs, &SamplingPolicy::GENERATION, None).unwrap();
        let t = tension_curve(&m, &ts, &SamplingPolicy::GENERATION).unwrap();
        let options = CdpOptions {
            units,
            ..CdpOptions::default()
        };
        build_material_card(&m, &cs, &ts, &c, &t, &options)
    }

    #[test]
    fn millimetre_card_keeps_mpa() {
        let c = card(UnitSystem::Millimetre);
        assert_eq!(c.elastic_modulus, 30_000.0);
        assert_eq!(c.density, 2.4e-9);
        assert_eq!(c.compression_hardening[20].stress, 50.0);
    }

    #[test]
    fn metre_card_rescales_every_stress() {
        let mm = card(UnitSystem::Millimetre);
        let m = card(UnitSystem::Metre);
        assert!((m.elastic_modulus - 3.0e10).abs() < 1.0);
        assert!((m.density - 2400.0).abs() < 1e-9);
        for (a, b) in mm.compression_hardening.iter().zip(&m.compression_hardening) {
            assert!((b.stress - 1e6 * a.stress).abs() <= 1e-6 * b.stress.abs());
            assert_eq!(a.strain, b.strain);
        }
        for (a, b) in mm.tension_stiffening.iter().zip(&m.tension_stiffening) {
            assert!((b.stress - 1e6 * a.stress).abs() <= 1e-6 * b.stress.abs());
        }
        assert_eq!(mm.compression_damage, m.compression_damage);
        assert_eq!(mm.tension_damage, m.tension_damage);
    }
}
