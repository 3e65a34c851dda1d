//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the curve/fit/damage code stays clean and testable
//! - output changes are localized (the golden tests below pin them)

use crate::damage::MaterialCard;
use crate::domain::{
    CompressionShape, GenerationConfig, Loading, MaterialParameters, StressStrainCurve,
    TensionMeasure, TensionShape, UnitSystem,
};
use crate::fit::{CompressionFit, FitDiagnostics, TensionFit};
use crate::models::softening_end_strain;
use crate::report::{FitResidual, rms};

/// Summary of a generation run: inputs, derived points, table sizes.
pub fn format_generation_summary(
    config: &GenerationConfig,
    compression: &StressStrainCurve,
    tension: &StressStrainCurve,
    card: &MaterialCard,
) -> String {
    let m = &config.material;
    let mut out = String::new();

    out.push_str("=== comat - CDP material generation ===\n");
    out.push_str(&format_material(m));
    out.push_str(&format_compression_shape(&config.compression));
    out.push_str(&format_tension_shape(&config.tension));

    out.push_str("\nDerived:\n");
    out.push_str(&format!("- e_0 = {:.4e} | S_c0 = {:.3} MPa\n", m.e_0(), m.s_c0()));
    out.push_str(&format!("- e_t0 = {:.4e}\n", m.e_t0()));
    out.push_str(&format!(
        "- compression softening end = {:.4e}\n",
        softening_end_strain(m, &config.compression)
    ));

    out.push_str("\nCurves:\n");
    out.push_str(&format!(
        "- compression: {} points | strain=[{:.4e}, {:.4e}]\n",
        compression.len(),
        first_strain(compression),
        last_strain(compression),
    ));
    out.push_str(&format!(
        "- tension    : {} points | strain=[{:.4e}, {:.4e}]\n",
        tension.len(),
        first_strain(tension),
        last_strain(tension),
    ));

    out.push_str("\nMaterial card:\n");
    out.push_str(&format!("- units: {}\n", units_label(card.units)));
    out.push_str(&format!(
        "- tension measure: {}\n",
        tension_measure_label(card.tension_measure)
    ));
    out.push_str(&format!(
        "- rows: hardening={} damage_c={} stiffening={} damage_t={}\n",
        card.compression_hardening.len(),
        card.compression_damage.len(),
        card.tension_stiffening.len(),
        card.tension_damage.len(),
    ));

    out
}

/// Summary of a calibration run, one block per fitted loading direction.
pub fn format_calibration_summary(
    material: &MaterialParameters,
    seed: u64,
    compression: Option<(&CompressionFit, &[FitResidual])>,
    tension: Option<(&TensionFit, &[FitResidual])>,
) -> String {
    let mut out = String::new();

    out.push_str("=== comat - softening calibration ===\n");
    out.push_str(&format_material(material));
    out.push_str(&format!("Seed: {seed}\n"));

    let mut warnings = Vec::new();

    if let Some((fit, residuals)) = compression {
        out.push_str("\nCompression fit:\n");
        out.push_str(&format!(
            "- Alpha = {:.6} | e_63 = {:.6e}\n",
            fit.shape.alpha, fit.shape.e_63
        ));
        out.push_str(&format_bounds("Alpha", "e_63", &fit.bounds.lower, &fit.bounds.upper));
        out.push_str(&format_diagnostics(&fit.diagnostics, residuals));
        warnings.extend(fit.diagnostics.warning(Loading::Compression));
    }

    if let Some((fit, residuals)) = tension {
        out.push_str("\nTension fit:\n");
        out.push_str(&format!(
            "- Beta = {:.6} | e_end = {:.6e}\n",
            fit.shape.beta, fit.shape.e_end
        ));
        out.push_str(&format_bounds("Beta", "e_end", &fit.bounds.lower, &fit.bounds.upper));
        out.push_str(&format_diagnostics(&fit.diagnostics, residuals));
        warnings.extend(fit.diagnostics.warning(Loading::Tension));
    }

    if !warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for w in warnings {
            out.push_str(&format!("! {w}\n"));
        }
    }

    out
}

/// Residual table (target vs fitted stress).
pub fn format_residual_table(rows: &[FitResidual]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>12} {:>12} {:>12} {:>12}\n",
        "strain", "target", "fitted", "residual"
    ));
    out.push_str(&format!("{:-<12} {:-<12} {:-<12} {:-<12}\n", "", "", "", ""));
    for r in rows {
        out.push_str(&format!(
            "{:>12.4e} {:>12.4} {:>12.4} {:>12.4}\n",
            r.strain, r.target, r.fitted, r.residual
        ));
    }
    out
}

fn format_material(m: &MaterialParameters) -> String {
    format!(
        "Material: E={:.3} GPa | S_cu={} MPa | e_cu={:.4e} | S_tu={} MPa\n",
        m.elastic_modulus / 1000.0,
        m.s_cu,
        m.e_cu,
        m.s_tu,
    )
}

fn format_compression_shape(s: &CompressionShape) -> String {
    format!("Compression: Alpha={} | e_63={:.4e}\n", s.alpha, s.e_63)
}

fn format_tension_shape(s: &TensionShape) -> String {
    format!("Tension: Beta={} | e_end={:.4e}\n", s.beta, s.e_end)
}

fn format_bounds(p0: &str, p1: &str, lower: &[f64; 2], upper: &[f64; 2]) -> String {
    format!(
        "- bounds: {p0}=[{}, {}] {p1}=[{:.4e}, {:.4e}]\n",
        lower[0], upper[0], lower[1], upper[1]
    )
}

fn format_diagnostics(d: &FitDiagnostics, residuals: &[FitResidual]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "- objective: seed={:.6e} final={:.6e}\n",
        d.seed_objective, d.objective
    ));
    out.push_str(&format!(
        "- search: samples={} iterations={} evaluations={} converged={}\n",
        d.seed_samples,
        d.iterations,
        d.evaluations,
        if d.converged { "yes" } else { "no" }
    ));
    out.push_str(&format!("- retained target samples: {}\n", d.retained_samples));
    if let Some(v) = rms(residuals) {
        out.push_str(&format!("- RMS residual (all samples): {v:.4} MPa\n"));
    }
    out
}

fn units_label(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Millimetre => "mm-N-MPa",
        UnitSystem::Metre => "m-N-Pa",
    }
}

fn tension_measure_label(measure: TensionMeasure) -> String {
    match measure {
        TensionMeasure::Strain => "cracking strain".to_string(),
        TensionMeasure::Displacement { reference_length } => {
            format!("cracking displacement (ref length {reference_length})")
        }
    }
}

fn first_strain(curve: &StressStrainCurve) -> f64 {
    curve.points.first().map(|p| p.strain).unwrap_or(0.0)
}

fn last_strain(curve: &StressStrainCurve) -> f64 {
    curve.points.last().map(|p| p.strain).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::build_material_card;
    use crate::domain::{CdpOptions, ParameterBounds, SamplingPolicy};
    use crate::models::{compression_curve, tension_curve};

    fn diagnostics(converged: bool) -> FitDiagnostics {
        FitDiagnostics {
            seed_objective: 12.5,
            objective: 0.25,
            iterations: 140,
            evaluations: 1290,
            converged,
            retained_samples: 31,
            seed_samples: 1000,
        }
    }

    #[test]
    fn generation_summary_lists_derived_points_and_rows() {
        let config = GenerationConfig {
            material: MaterialParameters::from_gpa(30.0, 50.0, 0.003, 5.0),
            compression: CompressionShape { alpha: 2.0, e_63: 0.005 },
            tension: TensionShape { beta: 1.2, e_end: 0.002 },
            cdp: CdpOptions::default(),
            sampling: SamplingPolicy::GENERATION,
            output_dir: None,
            plot: false,
            plot_width: 60,
            plot_height: 16,
        };
        let m = &config.material;
        let c = compression_curve(m, &config.compression, &config.sampling, None).unwrap();
        let t = tension_curve(m, &config.tension, &config.sampling).unwrap();
        let card = build_material_card(m, &config.compression, &config.tension, &c, &t, &config.cdp);

        let s = format_generation_summary(&config, &c, &t, &card);
        assert!(s.starts_with("=== comat - CDP material generation ===\n"));
        assert!(s.contains("Material: E=30.000 GPa | S_cu=50 MPa | e_cu=3.0000e-3 | S_tu=5 MPa\n"));
        assert!(s.contains("- compression: 90 points"));
        assert!(s.contains("- tension    : 70 points"));
        assert!(s.contains("- units: mm-N-MPa\n"));
        assert!(s.contains("hardening=70 damage_c=70"));
    }

    #[test]
    fn calibration_summary_reports_warning_for_unconverged_fit() {
        let m = MaterialParameters::from_gpa(30.0, 50.0, 0.003, 5.0);
        let fit = CompressionFit {
            shape: CompressionShape { alpha: 2.5, e_63: 0.004 },
            bounds: ParameterBounds::compression_default(),
            diagnostics: diagnostics(false),
        };
        let no_rows: &[FitResidual] = &[];
        let s = format_calibration_summary(&m, 7, Some((&fit, no_rows)), None);
        assert!(s.contains("Compression fit:\n- Alpha = 2.500000 | e_63 = 4.000000e-3\n"));
        assert!(s.contains("converged=no"));
        assert!(s.contains("Warnings:\n! Compression fit did not converge after 140 iterations"));
        assert!(!s.contains("Tension fit:"));
    }

    #[test]
    fn converged_fit_has_no_warning_block() {
        let m = MaterialParameters::from_gpa(30.0, 50.0, 0.003, 5.0);
        let fit = TensionFit {
            shape: TensionShape { beta: 2.0, e_end: 0.002 },
            bounds: ParameterBounds::tension_default(0.002),
            diagnostics: diagnostics(true),
        };
        let residuals = [FitResidual { strain: 0.001, target: 2.0, fitted: 1.5, residual: 0.5 }];
        let s = format_calibration_summary(&m, 7, None, Some((&fit, &residuals[..])));
        assert!(s.contains("Tension fit:"));
        assert!(s.contains("- RMS residual (all samples): 0.5000 MPa\n"));
        assert!(!s.contains("Warnings:"));
    }

    #[test]
    fn residual_table_has_header_and_rows() {
        let rows = [FitResidual { strain: 0.001, target: 2.0, fitted: 1.5, residual: 0.5 }];
        let t = format_residual_table(&rows);
        assert_eq!(t.lines().count(), 3);
        assert!(t.lines().nth(2).unwrap().trim_end().ends_with("0.5000"));
    }
}
