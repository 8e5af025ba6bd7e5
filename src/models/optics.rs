//! Newton's rings and optical rotation.

use crate::domain::{FitDetails, FitResult, PointMatrix, TransformedLine};
use crate::error::FitError;
use crate::fit::linear::{fit_line, format_line_equation};
use crate::models::{line_result, pair_columns};

/// Newton's rings: `D_n² = 4Rλ·n + c`.
///
/// Rows are `[n, D_n]`; the fit runs on `(n, D_n²)` and the slope is `4Rλ`.
pub fn fit_newtons_rings(points: &PointMatrix) -> Result<FitResult, FitError> {
    let (n, d) = pair_columns(points, "Newton's rings")?;
    let d_sq: Vec<f64> = d.iter().map(|v| v * v).collect();
    let line = fit_line(&n, &d_sq)?;

    Ok(FitResult {
        equation: format_line_equation("D²", "n", line.slope, line.intercept),
        description: format!(
            "Linear fit of squared ring diameter against ring number. \
             The slope {:.4} equals 4Rλ. R² = {:.6}.",
            line.slope, line.r_squared
        ),
        r_squared: Some(line.r_squared),
        details: FitDetails::Transformed(TransformedLine {
            slope: line.slope,
            intercept: line.intercept,
            transformed_points: n.iter().zip(&d_sq).map(|(&x, &y)| [x, y]).collect(),
        }),
    })
}

/// Polarimetry: rotation angle `θ` against concentration `c`.
///
/// The slope is the specific rotation times the path length.
pub fn fit_polarization(points: &PointMatrix) -> Result<FitResult, FitError> {
    let (c, theta) = pair_columns(points, "Polarization")?;
    let mut line = fit_line(&c, &theta)?;
    line.equation = format_line_equation("θ", "c", line.slope, line.intercept);
    line.description = format!(
        "Linear fit of rotation angle against concentration. The slope {:.4} is the \
         specific rotation times the path length. R² = {:.6}.",
        line.slope, line.r_squared
    );
    Ok(line_result(line))
}
