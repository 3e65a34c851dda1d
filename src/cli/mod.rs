//! Command-line parsing for the concrete material generator/calibrator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the curve/fit/damage code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::UnitSystem;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "comat",
    version,
    about = "Concrete stress-strain envelopes and CDP material cards"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate envelopes from known parameters and write the CDP material card.
    Generate(GenerateArgs),
    /// Fit the softening shape parameters to measured curves.
    Calibrate(CalibrateArgs),
    /// Plot a curve dump (optionally against target samples).
    Plot(PlotArgs),
}

/// Material parameters shared by every mode.
///
/// Optional so that `generate --from-fit` can take them from the calibration file.
#[derive(Debug, Args, Clone)]
pub struct MaterialArgs {
    /// Elastic modulus E (GPa).
    #[arg(short = 'E', long = "modulus", value_name = "GPA")]
    pub modulus: Option<f64>,

    /// Compressive ultimate stress S_cu (MPa).
    #[arg(long = "s-cu", value_name = "MPA")]
    pub s_cu: Option<f64>,

    /// Strain at the compressive ultimate stress e_cu.
    #[arg(long = "e-cu")]
    pub e_cu: Option<f64>,

    /// Tensile ultimate stress S_tu (MPa).
    #[arg(long = "s-tu", value_name = "MPA")]
    pub s_tu: Option<f64>,
}

/// Terminal plot options.
#[derive(Debug, Args, Clone)]
pub struct PlotOptions {
    /// Render ASCII plots in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    /// Take material and shape parameters from a calibration JSON file.
    ///
    /// Explicit flags override the values found in the file.
    #[arg(long = "from-fit", value_name = "JSON")]
    pub from_fit: Option<PathBuf>,

    #[command(flatten)]
    pub material: MaterialArgs,

    /// Compression softening exponent Alpha.
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Compression softening strain e_63.
    #[arg(long = "e-63")]
    pub e_63: Option<f64>,

    /// Tension softening exponent Beta.
    #[arg(long)]
    pub beta: Option<f64>,

    /// Tension end strain e_end.
    #[arg(long = "e-end")]
    pub e_end: Option<f64>,

    /// Density in tonne/mm³ (rescaled for --units metre).
    #[arg(long, default_value_t = 2.4e-9)]
    pub density: f64,

    /// Poisson's ratio.
    #[arg(long, default_value_t = 0.2)]
    pub poisson: f64,

    /// Tension stiffness recovery w_t.
    #[arg(long = "tension-recovery", default_value_t = 1.0)]
    pub tension_recovery: f64,

    /// Compression stiffness recovery w_c.
    #[arg(long = "compression-recovery", default_value_t = 0.0)]
    pub compression_recovery: f64,

    /// Reference length turning cracking strain into cracking displacement.
    #[arg(long = "ref-length", default_value_t = 1.0, conflicts_with = "strain_based_tension")]
    pub ref_length: f64,

    /// Write tension tables against cracking strain (no reference length).
    #[arg(long = "strain-based-tension")]
    pub strain_based_tension: bool,

    /// Unit system of the material card.
    #[arg(long, value_enum, default_value_t = UnitSystem::Millimetre)]
    pub units: UnitSystem,

    /// Output directory for CDP_Mat.inp and the curve dumps.
    #[arg(short, long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,

    /// Compute and report only; write nothing.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    #[command(flatten)]
    pub plot: PlotOptions,
}

#[derive(Debug, Parser, Clone)]
pub struct CalibrateArgs {
    #[command(flatten)]
    pub material: MaterialArgs,

    /// Measured compression curve (strain, stress in MPa).
    #[arg(long = "compression-target", value_name = "FILE")]
    pub compression_target: Option<PathBuf>,

    /// Measured tension curve (strain, stress in MPa).
    #[arg(long = "tension-target", value_name = "FILE")]
    pub tension_target: Option<PathBuf>,

    #[arg(long = "alpha-min", default_value_t = 0.5)]
    pub alpha_min: f64,

    #[arg(long = "alpha-max", default_value_t = 8.0)]
    pub alpha_max: f64,

    #[arg(long = "e63-min", default_value_t = 1e-4)]
    pub e63_min: f64,

    #[arg(long = "e63-max", default_value_t = 1e-2)]
    pub e63_max: f64,

    #[arg(long = "beta-min", default_value_t = 1.0)]
    pub beta_min: f64,

    #[arg(long = "beta-max", default_value_t = 5.0)]
    pub beta_max: f64,

    /// Lower bound on e_end (default: 0.9 × largest tension target strain).
    #[arg(long = "e-end-min", requires = "e_end_max")]
    pub e_end_min: Option<f64>,

    /// Upper bound on e_end (default: 1.1 × largest tension target strain).
    #[arg(long = "e-end-max", requires = "e_end_min")]
    pub e_end_max: Option<f64>,

    /// Uniform random draws seeding the simplex search.
    #[arg(long, default_value_t = 1000)]
    pub samples: usize,

    /// Simplex iteration cap.
    #[arg(long = "max-iter", default_value_t = 20_000)]
    pub max_iter: usize,

    /// Random seed (compression and tension use streams derived from it).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Write the fitted parameters to a calibration JSON file.
    #[arg(long = "export-fit", value_name = "JSON")]
    pub export_fit: Option<PathBuf>,

    /// Write preview curve dumps into this directory.
    #[arg(short, long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Print target vs fitted stress for every target sample.
    #[arg(long)]
    pub residuals: bool,

    #[command(flatten)]
    pub plot: PlotOptions,
}

/// Options for plotting a saved curve dump.
#[derive(Debug, Parser, Clone)]
pub struct PlotArgs {
    /// Curve dump produced by `comat generate` (e.g. Compression_SS.txt).
    #[arg(long, value_name = "FILE")]
    pub curve: PathBuf,

    /// Target samples to overlay.
    #[arg(long, value_name = "FILE")]
    pub target: Option<PathBuf>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_with_defaults() {
        let cli = Cli::try_parse_from([
            "comat", "generate", "-E", "30", "--s-cu", "50", "--e-cu", "0.003", "--s-tu", "5",
            "--alpha", "2", "--e-63", "0.005", "--beta", "1.2", "--e-end", "0.002",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.material.modulus, Some(30.0));
        assert_eq!(args.units, UnitSystem::Millimetre);
        assert_eq!(args.ref_length, 1.0);
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert!(!args.plot.plot);
    }

    #[test]
    fn e_end_bounds_must_come_in_pairs() {
        let res = Cli::try_parse_from([
            "comat", "calibrate", "-E", "30", "--s-cu", "50", "--e-cu", "0.003", "--s-tu", "5",
            "--tension-target", "t.csv", "--e-end-min", "0.001",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["comat", "plot", "--curve", "c.txt", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn metre_units_and_strain_based_tension() {
        let cli = Cli::try_parse_from([
            "comat", "generate", "--from-fit", "fit.json", "--units", "metre",
            "--strain-based-tension",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.units, UnitSystem::Metre);
        assert!(args.strain_based_tension);
        assert_eq!(args.from_fit, Some(PathBuf::from("fit.json")));
    }
}
