//! Photoelectric effect: stopping potentials from V–I curves and Planck's
//! constant from the stopping-voltage / frequency line.

use crate::domain::{
    CrossingMethod, FitDetails, FitResult, PlanckParams, PointMatrix, StoppingPotential,
};
use crate::error::FitError;
use crate::fit::cmc::format_general;
use crate::fit::linear::{fit_line, sign_symbol};
use crate::models::{label_for, pair_columns, require_series};

/// Elementary charge in coulombs (exact, SI 2019).
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Planck constant in J·s (exact, SI 2019).
pub const ACCEPTED_PLANCK: f64 = 6.626_070_15e-34;

/// Frequency columns whose largest magnitude is below this are read as THz.
const THZ_THRESHOLD: f64 = 1e6;

/// Locate where `y` crosses zero along x-sorted `x`.
///
/// Scanning in order, a sample that is exactly zero is returned as-is and the
/// first sign change is linearly interpolated. Without either, the sample with
/// the smallest `|y|` (first on ties) is returned. `None` for empty input.
pub fn zero_crossing(x: &[f64], y: &[f64]) -> Option<(f64, CrossingMethod)> {
    let n = x.len().min(y.len());
    for i in 0..n {
        if y[i] == 0.0 {
            return Some((x[i], CrossingMethod::Exact));
        }
        // Compare signs directly: the product of tiny currents underflows to zero.
        if i + 1 < n && y[i + 1] != 0.0 && (y[i] > 0.0) != (y[i + 1] > 0.0) {
            let t = y[i] / (y[i] - y[i + 1]);
            return Some((x[i] + t * (x[i + 1] - x[i]), CrossingMethod::Interpolated));
        }
    }

    let mut best: Option<usize> = None;
    for i in 0..n {
        if best.is_none_or(|b| y[i].abs() < y[b].abs()) {
            best = Some(i);
        }
    }
    best.map(|i| (x[i], CrossingMethod::NearestToZero))
}

/// Stopping potential per current series (`photoelectric-1-1`, `-1-3`).
///
/// Rows are `[V_bias, I_1, I_2, ...]`; `labels[i]` names series `i`.
pub fn fit_stopping_potentials(
    points: &PointMatrix,
    labels: &[String],
) -> Result<FitResult, FitError> {
    let series = require_series(points, "Photoelectric V–I")?;
    let sorted = points.sorted_by_x();
    let bias = sorted.column(0);

    let mut fits = Vec::with_capacity(series);
    for j in 0..series {
        let label = label_for(labels, j);
        let current = sorted.column(j + 1);
        let Some((v0, method)) = zero_crossing(&bias, &current) else {
            return Err(FitError::validation(format!("Series '{label}' has no data.")));
        };
        if method == CrossingMethod::NearestToZero {
            log::warn!(
                "series '{label}': current never changes sign, using the sample closest to zero"
            );
        }
        fits.push(StoppingPotential {
            label,
            stopping_potential: v0,
            method,
        });
    }

    let equation = fits
        .iter()
        .map(|f| format!("{}: V₀ = {:.4} V", f.label, f.stopping_potential))
        .collect::<Vec<_>>()
        .join("; ");

    Ok(FitResult {
        equation,
        description: format!(
            "Stopping potential for {} series, taken where the photocurrent crosses zero \
             (linear interpolation between the bracketing samples).",
            fits.len()
        ),
        r_squared: None,
        details: FitDetails::StoppingPotentials { series_fits: fits },
    })
}

/// Planck's constant from stopping voltage against frequency
/// (`photoelectric-1-2`).
///
/// `eV₀ = hν − W`, so the slope of `V₀(ν)` is `h/e` and the intercept is `−W/e`.
pub fn fit_planck(points: &PointMatrix) -> Result<FitResult, FitError> {
    let (nu, v_stop) = pair_columns(points, "Photoelectric V–ν")?;

    let max_nu = nu.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let (nu_hz, unit) = if max_nu < THZ_THRESHOLD {
        (nu.iter().map(|v| v * 1e12).collect::<Vec<_>>(), "THz")
    } else {
        (nu, "Hz")
    };

    let line = fit_line(&nu_hz, &v_stop)?;
    let h = line.slope * ELEMENTARY_CHARGE;
    let percent_error = (h - ACCEPTED_PLANCK).abs() / ACCEPTED_PLANCK * 100.0;
    let work_function_ev = -line.intercept;

    log::debug!("planck: frequency read as {unit}, h={h:.6e} J·s");

    Ok(FitResult {
        equation: format!(
            "V₀ = {}·ν {} {:.4}",
            format_general(line.slope, 4),
            sign_symbol(line.intercept),
            line.intercept.abs()
        ),
        description: format!(
            "Linear fit of stopping voltage against frequency (ν read in {unit}). \
             h = slope·e = {} J·s ({percent_error:.2}% from the accepted {} J·s); \
             work function = {work_function_ev:.4} eV. R² = {:.6}.",
            format_general(h, 4),
            format_general(ACCEPTED_PLANCK, 6),
            line.r_squared
        ),
        r_squared: Some(line.r_squared),
        details: FitDetails::Planck(PlanckParams {
            slope: line.slope,
            intercept: line.intercept,
            frequency_unit: unit.to_string(),
            planck_constant: h,
            accepted_planck_constant: ACCEPTED_PLANCK,
            percent_error,
            work_function_ev,
        }),
    })
}
