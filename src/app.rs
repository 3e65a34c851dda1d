//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments into run configurations
//! - runs generation / calibration
//! - prints reports/plots
//! - writes the requested files

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{CalibrateArgs, Command, GenerateArgs, MaterialArgs, PlotArgs};
use crate::domain::{
    CalibrationConfig, CdpOptions, CompressionShape, FlowPotential, GenerationConfig,
    MaterialParameters, ParameterBounds, SamplingPolicy, SearchOptions, TensionMeasure,
    TensionShape,
};
use crate::error::AppError;
use crate::io::{CalibrationFile, load_target_curve, read_fit_json};

pub mod pipeline;

/// Entry point for the `comat` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` may carry RUST_LOG, so load it before building the filter.
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Generate(args) => handle_generate(args),
        Command::Calibrate(args) => handle_calibrate(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "comat=info",
        1 => "comat=debug",
        _ => "comat=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let fit = match &args.from_fit {
        Some(path) => Some(read_fit_json(path)?),
        None => None,
    };
    let config = generation_config_from_args(&args, fit.as_ref())?;
    let run = pipeline::run_generation(&config)?;

    println!(
        "{}",
        crate::report::format_generation_summary(&config, &run.compression, &run.tension, &run.card)
    );

    if config.plot {
        println!(
            "{}",
            crate::plot::render_ascii_plot(
                "Compression",
                &run.compression.pairs(),
                &[],
                config.plot_width,
                config.plot_height
            )
        );
        println!(
            "{}",
            crate::plot::render_ascii_plot(
                "Tension",
                &run.tension.pairs(),
                &[],
                config.plot_width,
                config.plot_height
            )
        );
    }

    if let Some(dir) = &config.output_dir {
        for path in pipeline::write_generation(dir, &run)? {
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn handle_calibrate(args: CalibrateArgs) -> Result<(), AppError> {
    let config = calibration_config_from_args(&args)?;
    let run = pipeline::run_calibration(&config)?;

    println!(
        "{}",
        crate::report::format_calibration_summary(
            &config.material,
            config.seed,
            run.compression
                .as_ref()
                .map(|r| (&r.fit, r.residuals.as_slice())),
            run.tension.as_ref().map(|r| (&r.fit, r.residuals.as_slice())),
        )
    );
    if !run.row_errors.is_empty() {
        println!("Skipped {} non-numeric target row(s).", run.row_errors.len());
    }

    if config.show_residuals {
        if let Some(r) = &run.compression {
            println!(
                "Compression residuals:\n{}",
                crate::report::format_residual_table(&r.residuals)
            );
        }
        if let Some(r) = &run.tension {
            println!(
                "Tension residuals:\n{}",
                crate::report::format_residual_table(&r.residuals)
            );
        }
    }

    if config.plot {
        if let Some(r) = &run.compression {
            println!(
                "{}",
                crate::plot::render_ascii_plot(
                    "Compression fit",
                    &r.preview.pairs(),
                    &target_pairs(&r.target),
                    config.plot_width,
                    config.plot_height
                )
            );
        }
        if let Some(r) = &run.tension {
            println!(
                "{}",
                crate::plot::render_ascii_plot(
                    "Tension fit",
                    &r.preview.pairs(),
                    &target_pairs(&r.target),
                    config.plot_width,
                    config.plot_height
                )
            );
        }
    }

    for path in pipeline::write_calibration(&config, &run)? {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = load_target_curve(&args.curve)?;
    let target = match &args.target {
        Some(path) => target_pairs(&load_target_curve(path)?.curve),
        None => Vec::new(),
    };
    let title = args
        .curve
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Curve".to_string());

    println!(
        "{}",
        crate::plot::render_ascii_plot(
            &title,
            &target_pairs(&curve.curve),
            &target,
            args.width,
            args.height
        )
    );
    Ok(())
}

fn target_pairs(curve: &crate::domain::TargetCurve) -> Vec<(f64, f64)> {
    curve.points().iter().map(|p| (p.strain, p.stress)).collect()
}

fn required(value: Option<f64>, flag: &str) -> Result<f64, AppError> {
    value.ok_or_else(|| AppError::InvalidInput(format!("Missing required value `{flag}`.")))
}

/// Material from flags, falling back to `fallback` for anything not given.
fn material_from_args(
    args: &MaterialArgs,
    fallback: Option<&MaterialParameters>,
) -> Result<MaterialParameters, AppError> {
    let modulus = match args.modulus {
        Some(gpa) => Some(gpa * 1000.0),
        None => fallback.map(|m| m.elastic_modulus),
    };
    Ok(MaterialParameters {
        elastic_modulus: required(modulus, "--modulus")?,
        s_cu: required(args.s_cu.or(fallback.map(|m| m.s_cu)), "--s-cu")?,
        e_cu: required(args.e_cu.or(fallback.map(|m| m.e_cu)), "--e-cu")?,
        s_tu: required(args.s_tu.or(fallback.map(|m| m.s_tu)), "--s-tu")?,
    })
}

pub fn generation_config_from_args(
    args: &GenerateArgs,
    fit: Option<&CalibrationFile>,
) -> Result<GenerationConfig, AppError> {
    let material = material_from_args(&args.material, fit.map(|f| &f.material))?;
    let fitted_c = fit.and_then(|f| f.compression.as_ref()).map(|c| c.shape);
    let fitted_t = fit.and_then(|f| f.tension.as_ref()).map(|t| t.shape);

    let compression = CompressionShape {
        alpha: required(args.alpha.or(fitted_c.map(|s| s.alpha)), "--alpha")?,
        e_63: required(args.e_63.or(fitted_c.map(|s| s.e_63)), "--e-63")?,
    };
    let tension = TensionShape {
        beta: required(args.beta.or(fitted_t.map(|s| s.beta)), "--beta")?,
        e_end: required(args.e_end.or(fitted_t.map(|s| s.e_end)), "--e-end")?,
    };

    let tension_measure = if args.strain_based_tension {
        TensionMeasure::Strain
    } else {
        TensionMeasure::from_reference_length(Some(args.ref_length))
    };

    Ok(GenerationConfig {
        material,
        compression,
        tension,
        cdp: CdpOptions {
            density: args.density,
            poisson: args.poisson,
            flow: FlowPotential::default(),
            tension_recovery: args.tension_recovery,
            compression_recovery: args.compression_recovery,
            tension_measure,
            units: args.units,
        },
        sampling: SamplingPolicy::GENERATION,
        output_dir: (!args.dry_run).then(|| args.output_dir.clone()),
        plot: args.plot.plot,
        plot_width: args.plot.width,
        plot_height: args.plot.height,
    })
}

pub fn calibration_config_from_args(args: &CalibrateArgs) -> Result<CalibrationConfig, AppError> {
    let tension_end_bounds = match (args.e_end_min, args.e_end_max) {
        (Some(lo), Some(hi)) => Some((lo, hi)),
        _ => None,
    };
    Ok(CalibrationConfig {
        material: material_from_args(&args.material, None)?,
        compression_target: args.compression_target.clone(),
        tension_target: args.tension_target.clone(),
        compression_bounds: ParameterBounds::new(
            (args.alpha_min, args.alpha_max),
            (args.e63_min, args.e63_max),
        ),
        tension_exponent_bounds: (args.beta_min, args.beta_max),
        tension_end_bounds,
        search: SearchOptions {
            samples: args.samples,
            max_iterations: args.max_iter,
            ..SearchOptions::default()
        },
        seed: args.seed,
        output_dir: args.output_dir.clone(),
        export_fit: args.export_fit.clone(),
        show_residuals: args.residuals,
        plot: args.plot.plot,
        plot_width: args.plot.width,
        plot_height: args.plot.height,
    })
}
