//! Text exports: the CDP material card and the raw curve dumps.
//!
//! Number formatting follows the conventions the solver input decks are
//! usually written with:
//! - table rows: C-style `%.6e` (`3.000000e-03`)
//! - directive scalars: shortest round-trip decimal, `.0` on integral values,
//!   exponent form (`2.4e-09`) below `1e-4` or from `1e16` up

use std::fs;
use std::path::{Path, PathBuf};

use crate::damage::MaterialCard;
use crate::domain::{DamagePoint, HardeningPoint, StressStrainCurve, TensionMeasure};
use crate::error::AppError;

pub const MATERIAL_CARD_FILE: &str = "CDP_Mat.inp";
pub const COMPRESSION_DUMP_FILE: &str = "Compression_SS.txt";
pub const TENSION_DUMP_FILE: &str = "Tensile_SS.txt";

const CURVE_DUMP_HEADER: &str = "Strain, Stress(MPa)";

/// C-style `%.6e`: six mantissa decimals, signed exponent of at least two digits.
pub fn format_sci(v: f64) -> String {
    if !v.is_finite() {
        return non_finite(v);
    }
    let s = format!("{v:.6e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => s,
    }
}

/// Shortest round-trip decimal, switching to exponent form outside `[1e-4, 1e16)`.
pub fn format_scalar(v: f64) -> String {
    if !v.is_finite() {
        return non_finite(v);
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let exp_form = format!("{v:e}");
    let (mantissa, exp) = match exp_form.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => (exp_form.clone(), 0),
    };

    if !(-4..16).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.abs());
    }

    let plain = format!("{v}");
    if plain.contains('.') { plain } else { format!("{plain}.0") }
}

/// Integral values as `40.`, everything else as [`format_scalar`].
fn format_flow(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v}.")
    } else {
        format_scalar(v)
    }
}

fn non_finite(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v > 0.0 {
        "inf".to_string()
    } else {
        "-inf".to_string()
    }
}

fn push_row(out: &mut String, a: f64, b: f64) {
    out.push_str(&format_sci(a));
    out.push(',');
    out.push_str(&format_sci(b));
    out.push('\n');
}

fn push_stress_rows(out: &mut String, rows: &[HardeningPoint]) {
    for r in rows {
        push_row(out, r.stress, r.strain);
    }
}

fn push_damage_rows(out: &mut String, rows: &[DamagePoint]) {
    for r in rows {
        push_row(out, r.damage, r.strain);
    }
}

/// Render the complete material definition block.
pub fn render_material_card(card: &MaterialCard) -> String {
    let m = &card.material;
    let cs = &card.compression_shape;
    let ts = &card.tension_shape;
    let displacement = matches!(card.tension_measure, TensionMeasure::Displacement { .. });

    let mut out = String::new();
    out.push_str("**************************\n");
    out.push_str("*** CDP Mat Definition ***\n");
    out.push_str("**************************\n");
    out.push_str(&format!(
        "**E: {}, S_cu: {}, e_cu: {}, e_63: {}, Alpha: {}, S_tu: {}, e_end: {}, Beta: {}**\n",
        format_scalar(card.elastic_modulus),
        format_scalar(m.s_cu),
        format_scalar(m.e_cu),
        format_scalar(cs.e_63),
        format_scalar(cs.alpha),
        format_scalar(m.s_tu),
        format_scalar(ts.e_end),
        format_scalar(ts.beta),
    ));
    out.push_str("*Material, name=CDP\n");
    out.push_str("*Density\n");
    out.push_str(&format!("{}\n", format_scalar(card.density)));
    out.push_str("*Elastic\n");
    out.push_str(&format!(
        "{}, {}\n",
        format_scalar(card.elastic_modulus),
        format_scalar(card.poisson)
    ));

    match card.tension_measure {
        TensionMeasure::Displacement { reference_length } => out.push_str(&format!(
            "*Concrete Damaged Plasticity, REF LENGTH={}\n",
            format_scalar(reference_length)
        )),
        TensionMeasure::Strain => out.push_str("*Concrete Damaged Plasticity\n"),
    }
    let f = &card.flow;
    out.push_str(&format!(
        "{}, {}, {}, {}, {}\n",
        format_flow(f.dilation_angle),
        format_flow(f.eccentricity),
        format_flow(f.fb0_fc0),
        format_flow(f.k),
        format_flow(f.viscosity),
    ));

    out.push_str("*Concrete Compression Hardening\n");
    push_stress_rows(&mut out, &card.compression_hardening);

    if displacement {
        out.push_str("*Concrete Tension Stiffening, type=DISPLACEMENT\n");
    } else {
        out.push_str("*Concrete Tension Stiffening\n");
    }
    push_stress_rows(&mut out, &card.tension_stiffening);

    out.push_str(&format!(
        "*Concrete Compression Damage, tension recovery={}\n",
        format_scalar(card.tension_recovery)
    ));
    push_damage_rows(&mut out, &card.compression_damage);

    if displacement {
        out.push_str(&format!(
            "*Concrete Tension Damage, type=DISPLACEMENT, compression recovery={}\n",
            format_scalar(card.compression_recovery)
        ));
    } else {
        out.push_str(&format!(
            "*Concrete Tension Damage, compression recovery={}\n",
            format_scalar(card.compression_recovery)
        ));
    }
    push_damage_rows(&mut out, &card.tension_damage);

    out.push_str("*************************\n");
    out.push_str("*** End of Definition ***\n");
    out.push_str("*************************\n");
    out
}

/// Render a curve dump (`Strain, Stress(MPa)` + one `%.6e,%.6e` row per point).
pub fn render_curve_dump(curve: &StressStrainCurve) -> String {
    let mut out = String::with_capacity(32 * (curve.len() + 1));
    out.push_str(CURVE_DUMP_HEADER);
    out.push('\n');
    for p in &curve.points {
        push_row(&mut out, p.strain, p.stress);
    }
    out
}

fn write_text(path: &Path, text: &str) -> Result<(), AppError> {
    fs::write(path, text)
        .map_err(|e| AppError::Io(format!("Failed to write '{}': {e}", path.display())))
}

/// Write `CDP_Mat.inp` into `dir` and return its path.
pub fn write_material_card(dir: &Path, card: &MaterialCard) -> Result<PathBuf, AppError> {
    let path = dir.join(MATERIAL_CARD_FILE);
    write_text(&path, &render_material_card(card))?;
    tracing::info!(path = %path.display(), "wrote material card");
    Ok(path)
}

/// Write one curve dump to `path`.
pub fn write_curve_dump(path: &Path, curve: &StressStrainCurve) -> Result<(), AppError> {
    write_text(path, &render_curve_dump(curve))?;
    tracing::info!(path = %path.display(), points = curve.len(), "wrote curve dump");
    Ok(())
}

/// Write both curve dumps into `dir` and return their paths.
pub fn write_curve_dumps(
    dir: &Path,
    compression: &StressStrainCurve,
    tension: &StressStrainCurve,
) -> Result<[PathBuf; 2], AppError> {
    let c = dir.join(COMPRESSION_DUMP_FILE);
    let t = dir.join(TENSION_DUMP_FILE);
    write_curve_dump(&c, compression)?;
    write_curve_dump(&t, tension)?;
    Ok([c, t])
}

/// Create `dir` (and parents) if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(dir).map_err(|e| {
        AppError::Io(format!("Failed to create output directory '{}': {e}", dir.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::build_material_card;
    use crate::domain::{
        CdpOptions, CompressionShape, MaterialParameters, SamplingPolicy, TensionShape, UnitSystem,
    };
    use crate::models::{compression_curve, tension_curve};

    fn card(options: CdpOptions) -> MaterialCard {
        let m = MaterialParameters::from_gpa(30.0, 50.0, 0.003, 5.0);
        let cs = CompressionShape { alpha: 2.0, e_63: 0.005 };
        let ts = TensionShape { beta: 1.2, e_end: 0.002 };
        let c = compression_curve(&m, &cs, &SamplingPolicy::GENERATION, None).unwrap();
        let t = tension_curve(&m, &ts, &SamplingPolicy::GENERATION).unwrap();
        build_material_card(&m, &cs, &ts, &c, &t, &options)
    }

    #[test]
    fn sci_matches_c_printf() {
        assert_eq!(format_sci(0.003), "3.000000e-03");
        assert_eq!(format_sci(0.0), "0.000000e+00");
        assert_eq!(format_sci(50.0), "5.000000e+01");
        assert_eq!(format_sci(-1.5e-120), "-1.500000e-120");
        assert_eq!(format_sci(3.0e10), "3.000000e+10");
    }

    #[test]
    fn scalar_matches_shortest_repr() {
        assert_eq!(format_scalar(30000.0), "30000.0");
        assert_eq!(format_scalar(0.2), "0.2");
        assert_eq!(format_scalar(2.4e-9), "2.4e-09");
        assert_eq!(format_scalar(0.003), "0.003");
        assert_eq!(format_scalar(1e-4), "0.0001");
        assert_eq!(format_scalar(1e16), "1e+16");
        assert_eq!(format_scalar(3.0e10), "30000000000.0");
        assert_eq!(format_scalar(0.0), "0.0");
    }

    #[test]
    fn flow_line_prints_integral_angle_with_trailing_dot() {
        let text = render_material_card(&card(CdpOptions::default()));
        assert!(text.contains("\n40., 0.1, 1.16, 0.66667, 0.001\n"));
    }

    #[test]
    fn card_layout_in_millimetre_units() {
        let text = render_material_card(&card(CdpOptions::default()));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "**************************");
        assert_eq!(lines[1], "*** CDP Mat Definition ***");
        assert_eq!(
            lines[3],
            "**E: 30000.0, S_cu: 50.0, e_cu: 0.003, e_63: 0.005, Alpha: 2.0, S_tu: 5.0, e_end: 0.002, Beta: 1.2**"
        );
        assert_eq!(lines[4], "*Material, name=CDP");
        assert_eq!(lines[6], "2.4e-09");
        assert_eq!(lines[8], "30000.0, 0.2");
        assert_eq!(lines[9], "*Concrete Damaged Plasticity, REF LENGTH=1.0");
        assert_eq!(lines[11], "*Concrete Compression Hardening");
        assert_eq!(lines[12], "1.000000e+01,0.000000e+00");
        assert!(text.contains("*Concrete Tension Stiffening, type=DISPLACEMENT\n5.000000e+00,"));
        assert!(text.contains("*Concrete Compression Damage, tension recovery=1.0\n"));
        assert!(text.contains("*Concrete Tension Damage, type=DISPLACEMENT, compression recovery=0.0\n"));
        assert_eq!(lines[lines.len() - 2], "*** End of Definition ***");
        // 70 compression rows appear twice (hardening and damage).
        let rows = lines.iter().filter(|l| l.contains("e+") || l.contains("e-")).count();
        assert!(rows > 140);
    }

    #[test]
    fn strain_based_tension_drops_displacement_qualifiers() {
        let options = CdpOptions {
            tension_measure: TensionMeasure::Strain,
            ..CdpOptions::default()
        };
        let text = render_material_card(&card(options));
        assert!(!text.contains("REF LENGTH"));
        assert!(!text.contains("DISPLACEMENT"));
        assert!(text.contains("\n*Concrete Damaged Plasticity\n"));
        assert!(text.contains("\n*Concrete Tension Damage, compression recovery=0.0\n"));
    }

    #[test]
    fn metre_units_echo_modulus_in_pascal() {
        let options = CdpOptions {
            units: UnitSystem::Metre,
            ..CdpOptions::default()
        };
        let text = render_material_card(&card(options));
        assert!(text.contains("**E: 30000000000.0,"));
        assert!(text.contains("\n30000000000.0, 0.2\n"));
        assert!(text.contains("*Concrete Compression Hardening\n1.000000e+07,0.000000e+00\n"));
    }

    #[test]
    fn curve_dump_round_trips_through_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let m = MaterialParameters::from_gpa(30.0, 50.0, 0.003, 5.0);
        let ts = TensionShape { beta: 1.2, e_end: 0.002 };
        let t = tension_curve(&m, &ts, &SamplingPolicy::GENERATION).unwrap();
        let path = dir.path().join(TENSION_DUMP_FILE);
        write_curve_dump(&path, &t).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Strain, Stress(MPa)\n0.000000e+00,0.000000e+00\n"));

        let loaded = crate::io::load_target_curve(&path).unwrap();
        assert_eq!(loaded.curve.len(), 70);
        assert_eq!(loaded.row_errors.len(), 1);
    }

    #[test]
    fn writing_card_creates_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_material_card(dir.path(), &card(CdpOptions::default())).unwrap();
        assert_eq!(path.file_name().unwrap(), MATERIAL_CARD_FILE);
        let a = fs::read_to_string(&path).unwrap();
        let b = render_material_card(&card(CdpOptions::default()));
        assert_eq!(a, b);
    }
}
