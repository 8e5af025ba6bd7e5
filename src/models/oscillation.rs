//! Pohl's torsion pendulum: free damped decay and forced resonance.

use crate::domain::{DampedSeriesFit, FitDetails, FitResult, PointMatrix, Resonance};
use crate::error::FitError;
use crate::fit::linear::fit_line;
use crate::models::{label_for, require_series};

/// Damping constant per series from `ln φ = ln φ₀ − δ·t`.
///
/// Rows are `[t, φ_1, φ_2, ...]`. Non-positive amplitudes have no logarithm and
/// are dropped; a series left with fewer than two points is rejected.
pub fn fit_damped(points: &PointMatrix, labels: &[String]) -> Result<FitResult, FitError> {
    let series = require_series(points, "Damped oscillation")?;
    let t = points.column(0);

    let mut fits = Vec::with_capacity(series);
    for j in 0..series {
        let label = label_for(labels, j);
        let amplitude = points.column(j + 1);
        let (ts, ln_phi): (Vec<f64>, Vec<f64>) = t
            .iter()
            .zip(&amplitude)
            .filter(|(_, a)| **a > 0.0)
            .map(|(&ti, &a)| (ti, a.ln()))
            .unzip();

        let dropped = amplitude.len() - ts.len();
        if dropped > 0 {
            log::warn!("series '{label}': dropped {dropped} non-positive amplitude(s)");
        }
        if ts.len() < 2 {
            return Err(FitError::validation(format!(
                "Series '{label}' needs at least 2 positive amplitudes for a damping fit."
            )));
        }

        let line = fit_line(&ts, &ln_phi)?;
        fits.push(DampedSeriesFit {
            label,
            damping_constant: -line.slope,
            initial_amplitude: line.intercept.exp(),
            slope: line.slope,
            intercept: line.intercept,
            r_squared: line.r_squared,
            points_used: ts.len(),
        });
    }

    let equation = fits
        .iter()
        .map(|f| {
            format!(
                "{}: φ = {:.4}·e^(−{:.4}t)",
                f.label, f.initial_amplitude, f.damping_constant
            )
        })
        .collect::<Vec<_>>()
        .join("; ");

    Ok(FitResult {
        equation,
        description: format!(
            "Exponential decay φ = φ₀·e^(−δt) fitted per series as a line through \
             (t, ln φ); damping constant δ = −slope. {} series.",
            fits.len()
        ),
        r_squared: None,
        details: FitDetails::Damped { series_fits: fits },
    })
}

/// Resonance per series: the driving frequency with the largest amplitude.
///
/// Rows are `[f, A_1, A_2, ...]`. Rows are taken in frequency order and the
/// first maximum wins ties.
pub fn fit_forced(points: &PointMatrix, labels: &[String]) -> Result<FitResult, FitError> {
    let series = require_series(points, "Forced oscillation")?;
    let sorted = points.sorted_by_x();
    let freq = sorted.column(0);

    let mut fits = Vec::with_capacity(series);
    for j in 0..series {
        let amplitude = sorted.column(j + 1);
        let mut peak = 0;
        for (i, a) in amplitude.iter().enumerate() {
            if *a > amplitude[peak] {
                peak = i;
            }
        }
        fits.push(Resonance {
            label: label_for(labels, j),
            resonance_frequency: freq[peak],
            peak_amplitude: amplitude[peak],
        });
    }

    let equation = fits
        .iter()
        .map(|f| format!("{}: f_res = {:.4}", f.label, f.resonance_frequency))
        .collect::<Vec<_>>()
        .join("; ");

    Ok(FitResult {
        equation,
        description: format!(
            "Resonance taken as the driving frequency with the largest amplitude \
             in each of {} series.",
            fits.len()
        ),
        r_squared: None,
        details: FitDetails::Resonances { series_fits: fits },
    })
}
