//! Request-level domain types.
//!
//! These are kept serializable so they can be read from request files, echoed in
//! responses and passed to the plotter unchanged.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::{FitResult, Mode};
use crate::error::FitError;

/// Validated, rectangular table of finite numbers.
///
/// Built once per request and never mutated afterwards; estimators that need a
/// different ordering work on sorted copies.
#[derive(Debug, Clone, PartialEq)]
pub struct PointMatrix {
    rows: Vec<Vec<f64>>,
    width: usize,
}

impl PointMatrix {
    /// Build a matrix, rejecting ragged rows and non-finite values.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, FitError> {
        let Some(first) = rows.first() else {
            return Err(FitError::validation("No data points supplied."));
        };
        let width = first.len();
        if width == 0 {
            return Err(FitError::validation("Rows must contain at least one value."));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(FitError::validation(format!(
                    "Row {} has {} values, expected {width}.",
                    i + 1,
                    row.len()
                )));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(FitError::validation(format!(
                    "Row {}, column {} is not a finite number.",
                    i + 1,
                    j + 1
                )));
            }
        }
        Ok(Self { rows, width })
    }

    /// Convenience constructor for `[x, y]` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, FitError> {
        Self::new(pairs.iter().map(|&(x, y)| vec![x, y]).collect())
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Copy of column `j`.
    ///
    /// # Panics
    /// Panics if `j >= self.width()`.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[j]).collect()
    }

    /// Copy with rows stably sorted by the first column.
    pub fn sorted_by_x(&self) -> PointMatrix {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| a[0].total_cmp(&b[0]));
        PointMatrix {
            rows,
            width: self.width,
        }
    }
}

/// Resolve one label per data column beyond the independent variable.
///
/// Header `columns[i + 1]` names series `i` when present and non-blank;
/// anything missing falls back to the mode's positional default.
pub fn series_labels(mode: Mode, columns: &[String], width: usize) -> Vec<String> {
    (1..width)
        .map(|i| {
            columns
                .get(i)
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| mode.default_series_label(i))
        })
        .collect()
}

/// Which estimator refines the CMC model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CmcMethod {
    /// Grid search seed + bounded Levenberg–Marquardt.
    #[default]
    #[value(name = "lm")]
    LeastSquares,
    /// Multi-start Adam gradient descent.
    #[value(name = "adam")]
    GradientDescent,
}

impl CmcMethod {
    pub fn display_name(self) -> &'static str {
        match self {
            CmcMethod::LeastSquares => "grid search + nonlinear least squares",
            CmcMethod::GradientDescent => "multi-start gradient descent",
        }
    }
}

/// Incoming fit request (mirrors the HTTP payload of the web front-end).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitRequest {
    pub mode: String,
    pub points: Vec<Vec<f64>>,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// Packaged result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResponse {
    pub equation: String,
    pub description: String,
    pub points: Vec<Vec<f64>>,
    pub columns: Vec<String>,
    #[serde(rename = "graphImage")]
    pub graph_image: Option<String>,
    #[serde(rename = "fitParams")]
    pub fit_params: FitResult,
}

/// Runtime configuration for `graphfit fit`.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub mode: Option<String>,
    pub input: Option<PathBuf>,
    pub columns: Option<Vec<String>>,
    pub cmc_method: CmcMethod,
    pub seed: u64,
    pub learning_rate: f64,
    pub max_iters: usize,
    pub max_evals: usize,
    pub json: bool,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_are_rejected() {
        let err = PointMatrix::new(vec![vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert_eq!(err, FitError::validation("Row 2 has 1 values, expected 2."));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let err = PointMatrix::new(vec![vec![1.0, f64::NAN]]).unwrap_err();
        assert!(matches!(err, FitError::Validation(_)));
    }

    #[test]
    fn sorted_copy_leaves_original_untouched() {
        let m = PointMatrix::from_pairs(&[(3.0, 1.0), (1.0, 2.0), (2.0, 3.0)]).unwrap();
        let s = m.sorted_by_x();
        assert_eq!(s.column(0), vec![1.0, 2.0, 3.0]);
        assert_eq!(m.column(0), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn labels_default_per_mode_when_headers_missing() {
        let labels = series_labels(Mode::PohlsDamped, &[], 4);
        assert_eq!(labels, vec!["I_d = 1", "I_d = 2", "I_d = 3"]);

        let labels = series_labels(Mode::PhotoelectricWavelength, &[], 3);
        assert_eq!(labels, vec!["Series 1", "Series 2"]);
    }

    #[test]
    fn labels_skip_the_independent_variable_header() {
        let columns = vec!["V".to_string(), "λ=365nm".to_string(), " ".to_string()];
        let labels = series_labels(Mode::PhotoelectricWavelength, &columns, 4);
        assert_eq!(labels, vec!["λ=365nm", "Series 2", "Series 3"]);
    }

    #[test]
    fn request_columns_default_to_empty() {
        let req: FitRequest =
            serde_json::from_str(r#"{"mode":"cmc","points":[[1,2],[3,4]]}"#).unwrap();
        assert!(req.columns.is_empty());
        assert_eq!(req.points[1], vec![3.0, 4.0]);
    }
}
