//! Closed-form least-squares line fit.
//!
//! Used directly by the straight-line and polarization modes, and after a
//! variable transform by Newton's rings, Pohl's damped oscillation and the wave
//! modes.

use crate::error::FitError;
use crate::math::r_squared;

/// Below this `|nΣx² − (Σx)²|` all x-values are treated as identical.
const DENOM_EPS: f64 = 1e-15;

/// Result of a straight-line fit `y = slope·x + intercept`.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub equation: String,
    pub description: String,
}

/// Fit `y = m·x + c` by ordinary least squares.
pub fn fit_line(x: &[f64], y: &[f64]) -> Result<LineFit, FitError> {
    if x.len() != y.len() {
        return Err(FitError::validation(format!(
            "Line fit needs paired data, got {} x-values and {} y-values.",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 2 {
        return Err(FitError::validation(
            "Need at least 2 data points to fit a straight line.",
        ));
    }

    let nf = n as f64;
    let sx: f64 = x.iter().sum();
    let sy: f64 = y.iter().sum();
    let sxx: f64 = x.iter().map(|v| v * v).sum();
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();

    let denom = nf * sxx - sx * sx;
    if denom.abs() < DENOM_EPS {
        return Err(FitError::DegenerateInput(
            "All x-values are identical; a straight line cannot be fitted.".to_string(),
        ));
    }
    if !denom.is_finite() {
        return Err(FitError::DegenerateInput(
            "x-values are too large to fit a straight line.".to_string(),
        ));
    }

    let slope = (nf * sxy - sx * sy) / denom;
    let intercept = (sy - slope * sx) / nf;

    let predicted: Vec<f64> = x.iter().map(|&xi| slope * xi + intercept).collect();
    let r_sq = r_squared(y, &predicted);

    Ok(LineFit {
        slope,
        intercept,
        r_squared: r_sq,
        equation: format_line_equation("y", "x", slope, intercept),
        description: format!(
            "Fitted a straight line (y = mx + c) using least-squares regression. R² = {r_sq:.6}."
        ),
    })
}

/// Convenience wrapper over `(x, y)` pairs.
pub fn fit_line_pairs(pairs: &[(f64, f64)]) -> Result<LineFit, FitError> {
    let x: Vec<f64> = pairs.iter().map(|p| p.0).collect();
    let y: Vec<f64> = pairs.iter().map(|p| p.1).collect();
    fit_line(&x, &y)
}

/// Render `{y} = {m}{x} ± {|c|}` with 4 decimals.
///
/// A negative intercept prints as a subtraction (Unicode minus), never as
/// `+ -c`.
pub fn format_line_equation(y_name: &str, x_name: &str, slope: f64, intercept: f64) -> String {
    format!(
        "{y_name} = {slope:.4}{x_name} {} {:.4}",
        sign_symbol(intercept),
        intercept.abs()
    )
}

/// `+` for non-negative values, `−` otherwise.
pub fn sign_symbol(value: f64) -> char {
    if value >= 0.0 { '+' } else { '−' }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_line() {
        let x = [0.0, 1.5, 3.0, 4.0, 7.25];
        let y: Vec<f64> = x.iter().map(|v| -2.5 * v + 4.0).collect();
        let fit = fit_line(&x, &y).unwrap();
        assert!((fit.slope + 2.5).abs() < 1e-9);
        assert!((fit.intercept - 4.0).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn identical_x_is_degenerate() {
        let pairs = [(5.0, 1.0), (5.0, 2.0), (5.0, 3.0)];
        let err = fit_line_pairs(&pairs).unwrap_err();
        assert!(matches!(err, FitError::DegenerateInput(_)));
    }

    #[test]
    fn overflowing_sums_are_degenerate() {
        let err = fit_line(&[1e200, 2e200], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, FitError::DegenerateInput(_)), "{err:?}");
    }

    #[test]
    fn single_point_is_a_validation_error() {
        let err = fit_line(&[1.0], &[2.0]).unwrap_err();
        assert!(matches!(err, FitError::Validation(_)));
    }

    #[test]
    fn negative_intercept_prints_as_subtraction() {
        let fit = fit_line(&[0.0, 1.0, 2.0], &[-1.0, 1.0, 3.0]).unwrap();
        assert_eq!(fit.equation, "y = 2.0000x − 1.0000");
    }

    #[test]
    fn positive_intercept_prints_with_plus() {
        assert_eq!(format_line_equation("y", "x", 0.5, 3.0), "y = 0.5000x + 3.0000");
    }

    #[test]
    fn r_squared_stays_within_unit_interval_for_noisy_data() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [2.1, 3.9, 6.2, 7.8, 10.3, 11.7];
        let fit = fit_line(&x, &y).unwrap();
        assert!(fit.r_squared > 0.0 && fit.r_squared <= 1.0);
    }

    #[test]
    fn constant_target_has_zero_r_squared() {
        let fit = fit_line(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 0.0);
    }
}
