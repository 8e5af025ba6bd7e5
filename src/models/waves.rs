//! Wave velocity from `λ = v·(1/ν)`, for a vibrating rope and a closed pipe.

use crate::domain::{FitDetails, FitResult, PointMatrix, SoundWaveParams, WaveGroupFit};
use crate::error::FitError;
use crate::fit::linear::{fit_line, format_line_equation};
use crate::models::pair_columns;

/// `1/ν`, rejecting a zero frequency.
fn period(nu: f64) -> Result<f64, FitError> {
    if nu == 0.0 {
        return Err(FitError::validation("Frequency values must be non-zero."));
    }
    Ok(1.0 / nu)
}

/// Rope waves: rows `[group, ν, λ]`, one velocity per group.
///
/// Groups keep the order in which they first appear.
pub fn fit_rope(points: &PointMatrix) -> Result<FitResult, FitError> {
    if points.width() != 3 {
        return Err(FitError::validation(
            "Rope-wave data needs three columns: group, frequency and wavelength.",
        ));
    }

    let mut groups: Vec<(f64, Vec<[f64; 2]>)> = Vec::new();
    for row in points.rows() {
        let transformed = [period(row[1])?, row[2]];
        match groups.iter_mut().find(|(id, _)| *id == row[0]) {
            Some((_, pts)) => pts.push(transformed),
            None => groups.push((row[0], vec![transformed])),
        }
    }

    let mut fits = Vec::with_capacity(groups.len());
    for (id, pts) in groups {
        let label = format!("Group {id}");
        let x: Vec<f64> = pts.iter().map(|p| p[0]).collect();
        let y: Vec<f64> = pts.iter().map(|p| p[1]).collect();
        let line = fit_line(&x, &y).map_err(|e| match e {
            FitError::Validation(msg) => FitError::Validation(format!("{label}: {msg}")),
            FitError::DegenerateInput(msg) => FitError::DegenerateInput(format!("{label}: {msg}")),
            other => other,
        })?;
        fits.push(WaveGroupFit {
            label,
            group: id,
            velocity: line.slope,
            intercept: line.intercept,
            r_squared: line.r_squared,
            transformed_points: pts,
        });
    }

    let equation = fits
        .iter()
        .map(|f| format!("{}: v = {:.4} m/s", f.label, f.velocity))
        .collect::<Vec<_>>()
        .join("; ");

    Ok(FitResult {
        equation,
        description: format!(
            "Wavelength against period 1/ν fitted per group; the slope is the phase \
             velocity. {} group(s).",
            fits.len()
        ),
        r_squared: None,
        details: FitDetails::WaveGroups { series_fits: fits },
    })
}

/// Sound in a closed pipe: rows `[ν, L_cm]`.
///
/// The fundamental of a pipe closed at one end has `λ = 4L`, so the fit runs on
/// `(1/ν, 4L/100)` in metres and the slope is the speed of sound.
pub fn fit_sound(points: &PointMatrix) -> Result<FitResult, FitError> {
    let (nu, length_cm) = pair_columns(points, "Sound-wave")?;
    let inv_nu = nu.iter().map(|&v| period(v)).collect::<Result<Vec<_>, _>>()?;
    let lambda: Vec<f64> = length_cm.iter().map(|l| 4.0 * l / 100.0).collect();
    let line = fit_line(&inv_nu, &lambda)?;

    Ok(FitResult {
        equation: format_line_equation("λ", "·(1/ν)", line.slope, line.intercept),
        description: format!(
            "Closed-pipe resonance: λ = 4L against 1/ν. The slope gives the speed of \
             sound v = {:.4} m/s. R² = {:.6}.",
            line.slope, line.r_squared
        ),
        r_squared: Some(line.r_squared),
        details: FitDetails::SoundWave(SoundWaveParams {
            velocity: line.slope,
            intercept: line.intercept,
            transformed_points: inv_nu.iter().zip(&lambda).map(|(&x, &y)| [x, y]).collect(),
        }),
    })
}
