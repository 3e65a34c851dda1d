//! Target-curve ingest.
//!
//! Turns a two-column text file (`strain, stress`) into a validated
//! [`TargetCurve`]. Accepts:
//! - comma- or tab-delimited files (sniffed from the first line)
//! - an optional header row, or any non-numeric rows, which are skipped and
//!   reported instead of failing the whole load
//! - extra trailing columns, which are ignored
//!
//! The curve dumps written by `generate` (`Compression_SS.txt`,
//! `Tensile_SS.txt`) load through the same path.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::domain::{TargetCurve, TargetPoint};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: validated curve plus what was skipped.
#[derive(Debug, Clone)]
pub struct LoadedTarget {
    pub curve: TargetCurve,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Pick the delimiter from the first line: tab if it has more tabs than commas.
pub fn sniff_delimiter(first_line: &str) -> u8 {
    let tabs = first_line.matches('\t').count();
    let commas = first_line.matches(',').count();
    if tabs > commas { b'\t' } else { b',' }
}

/// Load a target curve from `path`.
pub fn load_target_curve(path: &Path) -> Result<LoadedTarget, AppError> {
    let open = || {
        File::open(path)
            .map_err(|e| AppError::Io(format!("Failed to open target file '{}': {e}", path.display())))
    };

    let mut first_line = String::new();
    BufReader::new(open()?)
        .read_line(&mut first_line)
        .map_err(|e| AppError::Io(format!("Failed to read '{}': {e}", path.display())))?;
    let delimiter = sniff_delimiter(&first_line);

    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(open()?);

    let loaded = parse_records(reader)?;
    tracing::debug!(
        path = %path.display(),
        rows_read = loaded.rows_read,
        rows_used = loaded.curve.len(),
        skipped = loaded.row_errors.len(),
        "loaded target curve"
    );
    Ok(loaded)
}

/// Load a target curve from in-memory text (same rules as [`load_target_curve`]).
pub fn parse_target_curve(text: &str) -> Result<LoadedTarget, AppError> {
    let delimiter = sniff_delimiter(text.lines().next().unwrap_or(""));
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    parse_records(reader)
}

fn parse_records<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<LoadedTarget, AppError> {
    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 1;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };
        if record.iter().all(|f| f.is_empty()) {
            rows_read -= 1;
            continue;
        }

        match parse_pair(&record) {
            Ok(point) => points.push(point),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let curve = TargetCurve::new(points)?;
    Ok(LoadedTarget {
        curve,
        row_errors,
        rows_read,
    })
}

fn parse_pair(record: &csv::StringRecord) -> Result<TargetPoint, String> {
    let field = |i: usize, name: &str| -> Result<f64, String> {
        let raw = record
            .get(i)
            .ok_or_else(|| format!("Missing {name} column."))?;
        let raw = raw.trim_start_matches('\u{feff}');
        let v: f64 = raw
            .parse()
            .map_err(|_| format!("Could not parse {name} '{raw}'."))?;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(format!("{name} '{raw}' is not finite."))
        }
    };
    Ok(TargetPoint {
        strain: field(0, "strain")?,
        stress: field(1, "stress")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sniffs_tab_and_comma() {
        assert_eq!(sniff_delimiter("0.0\t0.0"), b'\t');
        assert_eq!(sniff_delimiter("0.0,0.0"), b',');
        assert_eq!(sniff_delimiter("Strain, Stress(MPa)"), b',');
    }

    #[test]
    fn header_row_is_reported_not_fatal() {
        let text = "Strain, Stress(MPa)\n0.000000e+00,0.000000e+00\n1.000000e-03,3.000000e+01\n2.000000e-03,4.500000e+01\n";
        let loaded = parse_target_curve(text).unwrap();
        assert_eq!(loaded.curve.len(), 3);
        assert_eq!(loaded.rows_read, 4);
        assert_eq!(loaded.row_errors.len(), 1);
        assert_eq!(loaded.row_errors[0].line, 1);
        assert!((loaded.curve.points()[1].stress - 30.0).abs() < 1e-12);
    }

    #[test]
    fn tab_delimited_with_extra_columns() {
        let text = "0.0\t0.0\tx\n0.001\t20.0\ty\n0.002\t35.0\n\n";
        let loaded = parse_target_curve(text).unwrap();
        assert_eq!(loaded.curve.len(), 3);
        assert!(loaded.row_errors.is_empty());
    }

    #[test]
    fn decreasing_strain_is_invalid_input() {
        let text = "0.0,0.0\n0.002,10.0\n0.001,20.0\n";
        let err = parse_target_curve(text).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "0.0,0.0").unwrap();
        writeln!(f, "0.001,25.0").unwrap();
        let loaded = load_target_curve(f.path()).unwrap();
        assert_eq!(loaded.curve.len(), 2);
        assert_eq!(loaded.curve.max_strain(), 0.001);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_target_curve(Path::new("/nonexistent/target.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
