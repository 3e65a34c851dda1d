//! Read/write calibration JSON files.
//!
//! The calibration file is the portable record of a fit:
//! - material parameters the fit was conditioned on
//! - fitted shape parameters per loading direction, with bounds and diagnostics
//! - run metadata (timestamp, seed, seed sample count)
//!
//! `generate --from-fit` reads it back to emit the material card.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::MaterialParameters;
use crate::error::AppError;
use crate::fit::{CompressionFit, TensionFit};

pub const TOOL_NAME: &str = "comat";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFile {
    pub tool: String,
    pub generated: DateTime<Utc>,
    pub material: MaterialParameters,
    pub seed: u64,
    pub samples: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<CompressionFit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tension: Option<TensionFit>,
}

impl CalibrationFile {
    pub fn new(
        material: MaterialParameters,
        seed: u64,
        samples: usize,
        compression: Option<CompressionFit>,
        tension: Option<TensionFit>,
    ) -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            generated: Utc::now(),
            material,
            seed,
            samples,
            compression,
            tension,
        }
    }
}

/// Write a calibration JSON file.
pub fn write_fit_json(path: &Path, fit: &CalibrationFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::Io(format!("Failed to create fit JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, fit)
        .map_err(|e| AppError::Io(format!("Failed to write fit JSON: {e}")))?;
    tracing::info!(path = %path.display(), "wrote calibration file");
    Ok(())
}

/// Read a calibration JSON file.
pub fn read_fit_json(path: &Path) -> Result<CalibrationFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::Io(format!("Failed to open fit JSON '{}': {e}", path.display())))?;
    let fit: CalibrationFile =
        serde_json::from_reader(file).map_err(|e| AppError::Io(format!("Invalid fit JSON: {e}")))?;
    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CompressionShape, ParameterBounds};
    use crate::fit::FitDiagnostics;

    #[test]
    fn fit_file_survives_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.json");
        let compression = CompressionFit {
            shape: CompressionShape { alpha: 2.0, e_63: 0.005 },
            bounds: ParameterBounds::compression_default(),
            diagnostics: FitDiagnostics {
                seed_objective: 1.5,
                objective: 1e-12,
                iterations: 80,
                evaluations: 1160,
                converged: true,
                retained_samples: 33,
                seed_samples: 1000,
            },
        };
        let fit = CalibrationFile::new(
            MaterialParameters::from_gpa(30.0, 50.0, 0.003, 5.0),
            42,
            1000,
            Some(compression),
            None,
        );
        write_fit_json(&path, &fit).unwrap();

        let back = read_fit_json(&path).unwrap();
        assert_eq!(back, fit);
        assert!(back.tension.is_none());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"tool\": \"comat\""));
        assert!(!raw.contains("\"tension\""));
    }

    #[test]
    fn malformed_json_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read_fit_json(&path), Err(AppError::Io(_))));
    }
}
