//! Per-experiment model library.
//!
//! Each fitter takes a validated [`PointMatrix`] (plus series labels for the
//! multi-series modes) and returns a [`FitResult`]. Most of them reduce to the
//! closed-form line fit after a variable transform; the single-slit model is the
//! only one that needs the nonlinear solver.

pub mod diffraction;
pub mod optics;
pub mod oscillation;
pub mod photoelectric;
pub mod waves;

pub use diffraction::fit_single_slit;
pub use optics::{fit_newtons_rings, fit_polarization};
pub use oscillation::{fit_damped, fit_forced};
pub use photoelectric::{fit_planck, fit_stopping_potentials, zero_crossing};
pub use waves::{fit_rope, fit_sound};

use crate::domain::{FitDetails, FitResult, LineParams, PointMatrix};
use crate::error::FitError;
use crate::fit::linear::{LineFit, fit_line};

/// `y = m·x + c` on the raw pairs.
pub fn fit_straight_line(points: &PointMatrix) -> Result<FitResult, FitError> {
    let (x, y) = pair_columns(points, "Straight-line")?;
    Ok(line_result(fit_line(&x, &y)?))
}

/// First two columns of a pair-shaped matrix.
pub(crate) fn pair_columns(points: &PointMatrix, what: &str) -> Result<(Vec<f64>, Vec<f64>), FitError> {
    if points.width() < 2 {
        return Err(FitError::validation(format!("{what} data needs two columns.")));
    }
    Ok((points.column(0), points.column(1)))
}

/// Wrap a plain line fit, keeping its equation and description.
pub(crate) fn line_result(line: LineFit) -> FitResult {
    FitResult {
        equation: line.equation,
        description: line.description,
        r_squared: Some(line.r_squared),
        details: FitDetails::Line(LineParams {
            slope: line.slope,
            intercept: line.intercept,
        }),
    }
}

/// Require at least one dependent column next to the independent variable.
pub(crate) fn require_series(points: &PointMatrix, what: &str) -> Result<usize, FitError> {
    let series = points.width().saturating_sub(1);
    if series == 0 {
        return Err(FitError::validation(format!(
            "{what} data needs an independent-variable column and at least one series column."
        )));
    }
    Ok(series)
}

/// Label for series `i` (0-based), falling back to a positional name.
pub(crate) fn label_for(labels: &[String], i: usize) -> String {
    labels
        .get(i)
        .cloned()
        .unwrap_or_else(|| format!("Series {}", i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_keeps_line_params() {
        let points = PointMatrix::from_pairs(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap();
        let result = fit_straight_line(&points).unwrap();
        assert_eq!(result.equation, "y = 2.0000x + 1.0000");
        let FitDetails::Line(p) = result.details else {
            panic!("unexpected details");
        };
        assert!((p.slope - 2.0).abs() < 1e-12);
        assert!((result.r_squared.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn single_column_has_no_series() {
        let points = PointMatrix::new(vec![vec![1.0], vec![2.0]]).unwrap();
        assert!(require_series(&points, "Test").is_err());
    }
}
