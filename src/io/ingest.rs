//! Request ingest from CSV tables, JSON request files or stdin.
//!
//! Design goals:
//! - **Strict cells**: every data cell must parse as a number (clear errors + exit code 2)
//! - **No shape checks here**: row widths and counts are the dispatcher's job
//! - **Separation of concerns**: no fitting logic here

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{FitConfig, FitRequest, Mode};
use crate::error::AppError;
use crate::transcribe::Table;

/// JSON input: a fit request (the mode may come from the command line) or a
/// table written by `graphfit extract`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RequestFile {
    Points {
        #[serde(default)]
        mode: Option<String>,
        points: Vec<Vec<f64>>,
        #[serde(default)]
        columns: Vec<String>,
    },
    Transcribed(Table),
}

/// Header names plus numeric rows read from a CSV table.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

/// Build the fit request described by `config`.
///
/// `--mode` and `--columns` override whatever the input file carries.
pub fn load_request(config: &FitConfig) -> Result<FitRequest, AppError> {
    let file = match &config.input {
        Some(path) if is_csv(path) => {
            let table = parse_csv_table(open(path)?)?;
            RequestFile::Points {
                mode: None,
                points: table.rows,
                columns: table.columns,
            }
        }
        Some(path) => parse_request_json(open(path)?)?,
        None => parse_request_json(std::io::stdin().lock())?,
    };

    let (file_mode, points, columns) = match file {
        RequestFile::Points { mode, points, columns } => (mode, points, columns),
        RequestFile::Transcribed(table) => {
            let mode: Mode = config
                .mode
                .as_deref()
                .ok_or_else(|| AppError::new(2, "A transcribed table carries no mode; pass --mode."))?
                .parse()?;
            // Cells the transcriber could not read are rejected here.
            let req = table.into_request(mode)?;
            (Some(req.mode), req.points, req.columns)
        }
    };

    let mode = config
        .mode
        .clone()
        .or(file_mode)
        .ok_or_else(|| AppError::new(2, "No fitting mode given; pass --mode or set \"mode\" in the request."))?;
    let columns = config.columns.clone().unwrap_or(columns);

    log::debug!("ingest: mode={mode} rows={} columns={columns:?}", points.len());
    Ok(FitRequest {
        mode,
        points,
        columns,
    })
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(2, format!("Failed to open '{}': {e}", path.display())))
}

fn parse_request_json<R: Read>(reader: R) -> Result<RequestFile, AppError> {
    serde_json::from_reader(reader).map_err(|e| {
        AppError::new(
            2,
            format!("Invalid request JSON (expected {{points}} or a transcribed {{columns, rows}} table): {e}"),
        )
    })
}

/// Read a CSV table whose first row is the header.
///
/// Blank lines are skipped; any other non-numeric cell is an error naming its
/// line and column.
pub fn parse_csv_table<R: Read>(reader: R) -> Result<CsvTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header and lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("CSV parse error on line {line}: {e}")))?;
        if record.iter().all(|c| c.is_empty()) {
            continue;
        }

        let mut row = Vec::with_capacity(record.len());
        for (j, cell) in record.iter().enumerate() {
            let v = cell.parse::<f64>().map_err(|_| {
                AppError::new(2, format!("Line {line}, column {}: '{cell}' is not a number.", j + 1))
            })?;
            row.push(v);
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(AppError::new(2, "The CSV table has no data rows."));
    }
    Ok(CsvTable { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CmcMethod;
    use crate::io::export::write_json;
    use crate::transcribe::parse_table_response;

    #[test]
    fn csv_header_becomes_columns() {
        let csv = "V_bias, λ=365nm, λ=405nm\n-2,-0.1,-0.05\n\n0, 1.5, 1.2\n";
        let table = parse_csv_table(csv.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["V_bias", "λ=365nm", "λ=405nm"]);
        assert_eq!(table.rows, vec![vec![-2.0, -0.1, -0.05], vec![0.0, 1.5, 1.2]]);
    }

    #[test]
    fn non_numeric_cell_names_its_position() {
        let csv = "x,y\n1,2\n3,abc\n";
        let err = parse_csv_table(csv.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.message(), "Line 3, column 2: 'abc' is not a number.");
    }

    #[test]
    fn header_only_csv_is_rejected() {
        assert!(parse_csv_table("x,y\n".as_bytes()).is_err());
    }

    #[test]
    fn request_json_mode_is_optional() {
        let req = parse_request_json(r#"{"points": [[1, 2], [2, 4]]}"#.as_bytes()).unwrap();
        let RequestFile::Points { mode, points, columns } = req else {
            panic!("expected a points request");
        };
        assert!(mode.is_none());
        assert!(columns.is_empty());
        assert_eq!(points.len(), 2);
    }

    fn config_for(path: &Path, mode: &str) -> FitConfig {
        FitConfig {
            mode: Some(mode.to_string()),
            input: Some(path.to_path_buf()),
            columns: None,
            cmc_method: CmcMethod::LeastSquares,
            seed: 42,
            learning_rate: 1e-3,
            max_iters: 5000,
            max_evals: 20000,
            json: false,
            plot: false,
            plot_width: 72,
            plot_height: 20,
            export: None,
        }
    }

    fn write_transcribed(name: &str, reply: &str) -> std::path::PathBuf {
        let table = parse_table_response(reply).unwrap();
        let path = std::env::temp_dir().join(format!("graphfit-{name}-{}.json", std::process::id()));
        write_json(&path, &table).unwrap();
        path
    }

    #[test]
    fn extracted_table_loads_as_fit_request() {
        let path = write_transcribed("extracted", r#"{"columns":["x","y"],"rows":[[1,2],[2,4],[3,6]]}"#);
        let req = load_request(&config_for(&path, "straight-line"));
        std::fs::remove_file(&path).ok();

        let req = req.unwrap();
        assert_eq!(req.mode, "straight-line");
        assert_eq!(req.columns, vec!["x", "y"]);
        assert_eq!(req.points, vec![vec![1.0, 2.0], vec![2.0, 4.0], vec![3.0, 6.0]]);
    }

    #[test]
    fn unreadable_transcribed_cell_is_a_validation_error() {
        let path = write_transcribed("null-cell", r#"{"columns":["x","y"],"rows":[[1,2],[2,"smudge"]]}"#);
        let err = load_request(&config_for(&path, "straight-line"));
        std::fs::remove_file(&path).ok();

        let err = err.unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.message(), "Row 2, column 2 could not be read as a number.");
    }
}
