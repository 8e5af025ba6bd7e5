//! Single-slit diffraction: `I(θ) = I₀·sinc²(α(θ − θ₀))`.

use crate::domain::{DiffractionParams, FitDetails, FitResult, PointMatrix};
use crate::error::FitError;
use crate::fit::linear::sign_symbol;
use crate::fit::lm::{Bounds, LmOptions, levenberg_marquardt};
use crate::math::{r_squared, sinc_squared_intensity};
use crate::models::pair_columns;

/// Starting value for the width parameter `α`.
const ALPHA_SEED: f64 = 10.0;

fn intensity(theta: f64, p: &[f64]) -> f64 {
    sinc_squared_intensity(theta, p[0], p[1], p[2])
}

/// Fit the sinc² pattern by unbounded Levenberg–Marquardt.
///
/// Seeds: `I₀` = peak intensity, `θ₀` = angle of the (first) peak, `α = 10`.
/// `α` only enters squared through `sinc`, so it is reported as `|α|`.
pub fn fit_single_slit(points: &PointMatrix, opts: &LmOptions) -> Result<FitResult, FitError> {
    let (theta, intensity_obs) = pair_columns(points, "Single-slit")?;

    let mut peak = 0;
    for (i, v) in intensity_obs.iter().enumerate() {
        if *v > intensity_obs[peak] {
            peak = i;
        }
    }
    let seed = [intensity_obs[peak], ALPHA_SEED, theta[peak]];

    let report = levenberg_marquardt(
        intensity,
        &theta,
        &intensity_obs,
        &seed,
        &Bounds::unbounded(3),
        opts,
    );
    log::debug!(
        "single slit: seed={seed:?} -> params={:?} cost={:.6e} evals={}",
        report.params,
        report.cost,
        report.evaluations
    );
    if !report.converged() || report.params.iter().any(|p| !p.is_finite()) {
        return Err(not_converged());
    }

    let (i0, alpha, theta0) = (report.params[0], report.params[1].abs(), report.params[2]);
    let predicted: Vec<f64> = theta.iter().map(|&t| intensity(t, &report.params)).collect();
    let r_sq = r_squared(&intensity_obs, &predicted);
    // A local minimum worse than the mean intensity is not a fit.
    if r_sq.is_nan() || r_sq < 0.0 {
        log::warn!("single slit: rejected local minimum with R² = {r_sq:.4}");
        return Err(not_converged());
    }

    Ok(FitResult {
        equation: format!(
            "I = {i0:.4}·sinc²({alpha:.4}(θ {} {:.4}))",
            sign_symbol(-theta0),
            theta0.abs()
        ),
        description: format!(
            "Fraunhofer single-slit pattern I = I₀·sinc²(α(θ − θ₀)) fitted by nonlinear \
             least squares. R² = {r_sq:.6}."
        ),
        r_squared: Some(r_sq),
        details: FitDetails::Diffraction(DiffractionParams { i0, alpha, theta0 }),
    })
}

fn not_converged() -> FitError {
    FitError::Convergence(
        "Single-slit fit did not converge; check that the data covers the central maximum."
            .to_string(),
    )
}
