//! Shared generation and calibration workflows.
//!
//! Each workflow is split into a compute step that touches no files and a
//! write step, so that:
//! - every validation error surfaces before anything is written
//! - tests (and other front ends) can drive the core with in-memory data
//!
//! Generation: curves -> damage tables -> material card -> files.
//! Calibration: target files -> fits (compression and tension concurrently)
//! -> previews + residuals -> files.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::damage::{MaterialCard, build_material_card};
use crate::domain::{
    CalibrationConfig, GenerationConfig, Loading, SamplingPolicy, StressStrainCurve, TargetCurve,
};
use crate::error::AppError;
use crate::fit::{CompressionFit, FitWarning, TensionFit, calibrate_compression, calibrate_tension};
use crate::io::{
    CalibrationFile, RowError, ensure_output_dir, load_target_curve, write_curve_dumps,
    write_curve_dump, write_fit_json, write_material_card, COMPRESSION_DUMP_FILE,
    TENSION_DUMP_FILE,
};
use crate::models::{compression_curve, tension_curve, validate_material};
use crate::report::{FitResidual, compression_residuals, tension_residuals};

/// Offset between the compression and tension RNG streams derived from one seed.
const TENSION_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// All computed outputs of a `comat generate` run.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub compression: StressStrainCurve,
    pub tension: StressStrainCurve,
    pub card: MaterialCard,
}

/// Build both envelopes and the material card.
pub fn run_generation(config: &GenerationConfig) -> Result<GenerationOutput, AppError> {
    let m = &config.material;
    validate_material(m)?;

    let compression = compression_curve(m, &config.compression, &config.sampling, None)?;
    let tension = tension_curve(m, &config.tension, &config.sampling)?;
    let card = build_material_card(
        m,
        &config.compression,
        &config.tension,
        &compression,
        &tension,
        &config.cdp,
    );

    tracing::debug!(
        compression_points = compression.len(),
        tension_points = tension.len(),
        hardening_rows = card.compression_hardening.len(),
        stiffening_rows = card.tension_stiffening.len(),
        "generated curves"
    );

    Ok(GenerationOutput {
        compression,
        tension,
        card,
    })
}

/// Write `CDP_Mat.inp` and both curve dumps into `dir`.
pub fn write_generation(dir: &Path, output: &GenerationOutput) -> Result<Vec<PathBuf>, AppError> {
    ensure_output_dir(dir)?;
    let card = write_material_card(dir, &output.card)?;
    let [c, t] = write_curve_dumps(dir, &output.compression, &output.tension)?;
    Ok(vec![card, c, t])
}

/// Fit result for compression plus what it was fitted against.
#[derive(Debug, Clone)]
pub struct CompressionRun {
    pub target: TargetCurve,
    pub fit: CompressionFit,
    /// Sparse envelope running to the largest target strain.
    pub preview: StressStrainCurve,
    pub residuals: Vec<FitResidual>,
}

/// Fit result for tension plus what it was fitted against.
#[derive(Debug, Clone)]
pub struct TensionRun {
    pub target: TargetCurve,
    pub fit: TensionFit,
    pub preview: StressStrainCurve,
    pub residuals: Vec<FitResidual>,
}

/// All computed outputs of a `comat calibrate` run.
#[derive(Debug, Clone)]
pub struct CalibrationOutput {
    pub compression: Option<CompressionRun>,
    pub tension: Option<TensionRun>,
    /// Skipped target rows, tagged with the file they came from.
    pub row_errors: Vec<(Loading, RowError)>,
    pub file: CalibrationFile,
}

impl CalibrationOutput {
    pub fn warnings(&self) -> Vec<FitWarning> {
        let c = self
            .compression
            .as_ref()
            .and_then(|r| r.fit.diagnostics.warning(Loading::Compression));
        let t = self
            .tension
            .as_ref()
            .and_then(|r| r.fit.diagnostics.warning(Loading::Tension));
        c.into_iter().chain(t).collect()
    }
}

/// Seed of the RNG stream used for one loading direction.
pub fn stream_seed(seed: u64, loading: Loading) -> u64 {
    match loading {
        Loading::Compression => seed,
        Loading::Tension => seed.wrapping_add(TENSION_STREAM),
    }
}

/// Load the configured target files and calibrate.
pub fn run_calibration(config: &CalibrationConfig) -> Result<CalibrationOutput, AppError> {
    if config.compression_target.is_none() && config.tension_target.is_none() {
        return Err(AppError::InvalidInput(
            "Calibration needs a compression target, a tension target, or both.".to_string(),
        ));
    }

    let mut row_errors = Vec::new();
    let mut load = |path: &Option<PathBuf>, loading: Loading| -> Result<Option<TargetCurve>, AppError> {
        let Some(path) = path else {
            return Ok(None);
        };
        let loaded = load_target_curve(path)?;
        for e in &loaded.row_errors {
            tracing::warn!(
                loading = loading.display_name(),
                line = e.line,
                "skipped target row: {}",
                e.message
            );
        }
        row_errors.extend(loaded.row_errors.into_iter().map(|e| (loading, e)));
        Ok(Some(loaded.curve))
    };
    let compression = load(&config.compression_target, Loading::Compression)?;
    let tension = load(&config.tension_target, Loading::Tension)?;

    let mut output = run_calibration_with_targets(config, compression, tension)?;
    output.row_errors = row_errors;
    Ok(output)
}

/// Calibrate against in-memory targets.
///
/// Compression and tension are fitted concurrently on independent RNG streams,
/// so the result does not depend on which finishes first.
pub fn run_calibration_with_targets(
    config: &CalibrationConfig,
    compression_target: Option<TargetCurve>,
    tension_target: Option<TargetCurve>,
) -> Result<CalibrationOutput, AppError> {
    validate_material(&config.material)?;
    config.compression_bounds.validate("Compression")?;

    let (compression, tension) = rayon::join(
        || compression_target.map(|t| fit_compression(config, t)).transpose(),
        || tension_target.map(|t| fit_tension(config, t)).transpose(),
    );
    let compression = compression?;
    let tension = tension?;

    let file = CalibrationFile::new(
        config.material,
        config.seed,
        config.search.samples,
        compression.as_ref().map(|r| r.fit),
        tension.as_ref().map(|r| r.fit),
    );

    Ok(CalibrationOutput {
        compression,
        tension,
        row_errors: Vec::new(),
        file,
    })
}

fn fit_compression(config: &CalibrationConfig, target: TargetCurve) -> Result<CompressionRun, AppError> {
    let m = &config.material;
    let mut rng = StdRng::seed_from_u64(stream_seed(config.seed, Loading::Compression));
    let fit = calibrate_compression(m, &target, &config.compression_bounds, &config.search, &mut rng)?;
    let preview = compression_curve(
        m,
        &fit.shape,
        &SamplingPolicy::CALIBRATION,
        Some(target.max_strain()),
    )?;
    let residuals = compression_residuals(m, &fit.shape, &target);
    Ok(CompressionRun {
        target,
        fit,
        preview,
        residuals,
    })
}

fn fit_tension(config: &CalibrationConfig, target: TargetCurve) -> Result<TensionRun, AppError> {
    let m = &config.material;
    let bounds = config.tension_bounds(target.max_strain());
    let mut rng = StdRng::seed_from_u64(stream_seed(config.seed, Loading::Tension));
    let fit = calibrate_tension(m, &target, &bounds, &config.search, &mut rng)?;
    let preview = tension_curve(m, &fit.shape, &SamplingPolicy::CALIBRATION)?;
    let residuals = tension_residuals(m, &fit.shape, &target);
    Ok(TensionRun {
        target,
        fit,
        preview,
        residuals,
    })
}

/// Write the calibration JSON and the preview dumps, as configured.
pub fn write_calibration(
    config: &CalibrationConfig,
    output: &CalibrationOutput,
) -> Result<Vec<PathBuf>, AppError> {
    let mut written = Vec::new();

    if let Some(path) = &config.export_fit {
        write_fit_json(path, &output.file)?;
        written.push(path.clone());
    }

    if let Some(dir) = &config.output_dir {
        ensure_output_dir(dir)?;
        if let Some(run) = &output.compression {
            let path = dir.join(COMPRESSION_DUMP_FILE);
            write_curve_dump(&path, &run.preview)?;
            written.push(path);
        }
        if let Some(run) = &output.tension {
            let path = dir.join(TENSION_DUMP_FILE);
            write_curve_dump(&path, &run.preview)?;
            written.push(path);
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CdpOptions, CompressionShape, MaterialParameters, ParameterBounds, SearchOptions,
        TargetPoint, TensionShape,
    };
    use crate::models::{compression_stress, tension_stress};

    fn material() -> MaterialParameters {
        MaterialParameters::from_gpa(30.0, 50.0, 0.003, 5.0)
    }

    fn generation_config() -> GenerationConfig {
        GenerationConfig {
            material: material(),
            compression: CompressionShape { alpha: 2.0, e_63: 0.005 },
            tension: TensionShape { beta: 1.2, e_end: 0.002 },
            cdp: CdpOptions::default(),
            sampling: SamplingPolicy::GENERATION,
            output_dir: None,
            plot: false,
            plot_width: 60,
            plot_height: 16,
        }
    }

    fn calibration_config() -> CalibrationConfig {
        CalibrationConfig {
            material: material(),
            compression_target: None,
            tension_target: None,
            compression_bounds: ParameterBounds::compression_default(),
            tension_exponent_bounds: (1.0, 5.0),
            tension_end_bounds: None,
            search: SearchOptions {
                samples: 200,
                ..SearchOptions::default()
            },
            seed: 42,
            output_dir: None,
            export_fit: None,
            show_residuals: false,
            plot: false,
            plot_width: 60,
            plot_height: 16,
        }
    }

    fn targets() -> (TargetCurve, TargetCurve) {
        let m = material();
        let cs = CompressionShape { alpha: 1.8, e_63: 0.006 };
        let ts = TensionShape { beta: 1.5, e_end: 0.0015 };
        let c = (0..=30)
            .map(|i| {
                let strain = i as f64 * 0.0005;
                TargetPoint { strain, stress: compression_stress(&m, &cs, strain) }
            })
            .collect();
        let t = (0..=20)
            .map(|i| {
                let strain = i as f64 * 0.0015 / 20.0;
                TargetPoint { strain, stress: tension_stress(&m, &ts, strain) }
            })
            .collect();
        (TargetCurve::new(c).unwrap(), TargetCurve::new(t).unwrap())
    }

    #[test]
    fn generation_is_idempotent() {
        let config = generation_config();
        let a = run_generation(&config).unwrap();
        let b = run_generation(&config).unwrap();
        assert_eq!(a.compression, b.compression);
        assert_eq!(a.tension, b.tension);
        assert_eq!(a.card, b.card);
    }

    #[test]
    fn generation_rejects_bad_material_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = generation_config();
        config.material.e_cu = 0.01;
        assert!(matches!(
            run_generation(&config),
            Err(AppError::InvalidParameterRange(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn write_generation_emits_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_generation(&generation_config()).unwrap();
        let files = write_generation(dir.path(), &out).unwrap();
        assert_eq!(files.len(), 3);
        for f in files {
            assert!(f.exists());
        }
    }

    #[test]
    fn calibration_is_deterministic_for_a_seed() {
        let (c, t) = targets();
        let config = calibration_config();
        let a = run_calibration_with_targets(&config, Some(c.clone()), Some(t.clone())).unwrap();
        let b = run_calibration_with_targets(&config, Some(c), Some(t)).unwrap();
        let (ca, cb) = (a.compression.unwrap(), b.compression.unwrap());
        let (ta, tb) = (a.tension.unwrap(), b.tension.unwrap());
        assert_eq!(ca.fit.shape, cb.fit.shape);
        assert_eq!(ca.fit.diagnostics.objective, cb.fit.diagnostics.objective);
        assert_eq!(ta.fit.shape, tb.fit.shape);
        assert_eq!(ta.fit.diagnostics.objective, tb.fit.diagnostics.objective);
    }

    #[test]
    fn calibration_recovers_shapes_and_builds_previews() {
        let (c, t) = targets();
        let out = run_calibration_with_targets(&calibration_config(), Some(c.clone()), Some(t)).unwrap();
        let comp = out.compression.unwrap();
        assert!((comp.fit.shape.alpha - 1.8).abs() < 1e-3);
        assert!((comp.fit.shape.e_63 - 0.006).abs() < 1e-6);
        assert_eq!(comp.preview.len(), 30);
        assert_eq!(comp.preview.points[29].strain, c.max_strain());
        assert_eq!(comp.residuals.len(), c.len());

        let tens = out.tension.unwrap();
        assert!((tens.fit.shape.beta - 1.5).abs() < 1e-3);
        assert!((tens.fit.shape.e_end - 0.0015).abs() < 1e-7);
        assert_eq!(tens.preview.len(), 25);
        assert!(out.file.compression.is_some() && out.file.tension.is_some());
    }

    #[test]
    fn calibration_without_targets_is_invalid_input() {
        let err = run_calibration(&calibration_config()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn tension_stream_differs_from_compression_stream() {
        assert_ne!(
            stream_seed(42, Loading::Compression),
            stream_seed(42, Loading::Tension)
        );
        assert_eq!(stream_seed(7, Loading::Compression), 7);
    }
}
