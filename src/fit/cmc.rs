//! Critical micelle concentration (CMC) estimation.
//!
//! Model (Szyszkowski-type, continuous at the breakpoint):
//!
//! ```text
//! γ(x) = a + b·ln(1 + c·x)     x <  x0   (adsorption regime)
//! γ(x) = a + b·ln(1 + c·x0)    x >= x0   (micelle plateau)
//! ```
//!
//! Four free parameters `(a, b, c, x0)`; the breakpoint `x0` is the CMC.
//!
//! This module holds the nonlinear least-squares estimator (grid-search seed +
//! bounded Levenberg–Marquardt) together with the pieces shared with the
//! gradient-descent estimator in [`crate::fit::adam`]: data preparation and
//! result packaging.

use crate::domain::{CmcMethod, CmcParams, FitDetails, FitResult, PointMatrix};
use crate::error::FitError;
use crate::fit::breakpoint::{MIN_POINTS, search_breakpoint};
use crate::fit::lm::{Bounds, LmOptions, levenberg_marquardt};
use crate::fit::linear::sign_symbol;
use crate::math::{cmc_model, cmc_plateau, r_squared};

/// Lower bound on `c` for the least-squares estimator.
const C_MIN: f64 = 1e-12;

/// x-sorted concentration / surface-tension columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CmcData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl CmcData {
    /// Sort by concentration and check the minimum point count.
    pub fn prepare(points: &PointMatrix) -> Result<Self, FitError> {
        if points.len() < MIN_POINTS {
            return Err(FitError::validation(format!(
                "Need at least {MIN_POINTS} data points to fit the CMC model."
            )));
        }
        if points.width() < 2 {
            return Err(FitError::validation("CMC data needs two columns."));
        }
        let sorted = points.sorted_by_x();
        Ok(Self {
            x: sorted.column(0),
            y: sorted.column(1),
        })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x_min(&self) -> f64 {
        self.x[0]
    }

    pub fn x_max(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    pub fn y_min(&self) -> f64 {
        self.y.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn y_max(&self) -> f64 {
        self.y.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smallest strictly positive concentration, if any.
    pub fn min_positive_x(&self) -> Option<f64> {
        self.x.iter().copied().filter(|v| *v > 0.0).reduce(f64::min)
    }

    /// Sum of squared residuals of the continuous model.
    pub fn sse(&self, params: &[f64]) -> f64 {
        self.x
            .iter()
            .zip(&self.y)
            .map(|(&xi, &yi)| {
                let r = cmc_model(xi, params) - yi;
                r * r
            })
            .sum()
    }
}

/// Fit the CMC model by grid search + bounded nonlinear least squares.
pub fn fit_cmc(points: &PointMatrix, opts: &LmOptions) -> Result<FitResult, FitError> {
    let data = CmcData::prepare(points)?;

    // a ≈ surface tension of the pure solvent, b < 0 because tension falls with
    // concentration, 1/c sets the concentration scale of the log.
    let a0 = data.y_max();
    let b0 = data.y_min() - data.y_max();
    let c0 = 1.0 / data.min_positive_x().unwrap_or(1.0);
    let x00 = search_breakpoint(&data.x, &data.y)?.x0;
    let seed = [a0, b0, c0, x00];

    let bounds = Bounds::new(
        vec![f64::NEG_INFINITY, f64::NEG_INFINITY, C_MIN, data.x_min()],
        vec![f64::INFINITY, f64::INFINITY, f64::INFINITY, data.x_max()],
    );

    let report = levenberg_marquardt(cmc_model, &data.x, &data.y, &seed, &bounds, opts);
    log::debug!(
        "cmc lm: seed={seed:?} -> params={:?} cost={:.6e} evals={} termination={:?}",
        report.params,
        report.cost,
        report.evaluations,
        report.termination
    );

    if !report.converged() || report.params.iter().any(|p| !p.is_finite()) {
        return Err(FitError::Convergence(
            "CMC fitting failed; check that the data has a clear transition from \
             decreasing surface tension to a plateau."
                .to_string(),
        ));
    }

    Ok(cmc_result(&data, &report.params, CmcMethod::LeastSquares))
}

/// Package optimized parameters `[a, b, c, x0]` as a fit result.
pub fn cmc_result(data: &CmcData, params: &[f64], method: CmcMethod) -> FitResult {
    let (a, b, c, x0) = (params[0], params[1], params[2], params[3]);
    let plateau = cmc_plateau(a, b, c, x0);

    let predicted: Vec<f64> = data.x.iter().map(|&xi| cmc_model(xi, params)).collect();
    let r_sq = r_squared(&data.y, &predicted);

    let equation_pre_cmc = format!(
        "γ = {a:.4} {} {:.4}·ln(1 + {c:.4}·x)",
        sign_symbol(b),
        b.abs()
    );
    let equation_post_cmc = format!("γ = {plateau:.4}");
    let cmc_text = format_general(x0, 4);

    let prefix = match method {
        CmcMethod::LeastSquares => "Szyszkowski-type model",
        CmcMethod::GradientDescent => "Szyszkowski-type model (gradient descent)",
    };

    FitResult {
        equation: format!("CMC ≈ {cmc_text}"),
        description: format!(
            "{prefix}: γ = a + b·ln(1 + c·x) for x < CMC, γ = constant for x ≥ CMC. \
             Breakpoint at x = {cmc_text} gives the CMC. R² = {r_sq:.6}."
        ),
        r_squared: Some(r_sq),
        details: FitDetails::Cmc(CmcParams {
            cmc_value: x0,
            cmc_surface_tension: plateau,
            a,
            b,
            c,
            equation_pre_cmc,
            equation_post_cmc,
            method,
        }),
    }
}

/// Format with `sig` significant digits, switching to exponent notation for
/// very small or large magnitudes (like C's `%g`).
pub fn format_general(value: f64, sig: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }
    let sig = sig.max(1);
    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= sig as i32 {
        let s = format!("{:.*e}", sig - 1, value);
        // Trim trailing zeros in the mantissa: 8.000e-3 -> 8e-3.
        match s.split_once('e') {
            Some((mantissa, exp)) => {
                let mantissa = trim_fraction(mantissa);
                format!("{mantissa}e{exp}")
            }
            None => s,
        }
    } else {
        let decimals = (sig as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Pre-drawn N(0, 0.1²) noise so the synthetic fits are reproducible.
    pub(crate) const NOISE: [f64; 25] = [
        -0.0256, 0.0511, -0.0226, -0.0315, -0.093, -0.0213, 0.1112, 0.0424, 0.1037, 0.0249,
        0.0395, 0.0185, -0.1666, 0.0855, 0.0506, 0.0499, -0.1691, -0.1744, -0.089, -0.0468,
        0.0305, -0.0046, 0.0521, -0.0642, 0.0309,
    ];

    pub(crate) const TRUE_PARAMS: [f64; 4] = [72.0, -30.0, 500.0, 0.008];

    /// 15 points evenly spaced from 1e-4 up to the CMC (exclusive), then 10
    /// points from the CMC to three times the CMC, with noise added.
    pub(crate) fn noisy_surface_tension() -> PointMatrix {
        let x0 = TRUE_PARAMS[3];
        let mut xs: Vec<f64> = (0..15).map(|i| 1e-4 + (x0 - 1e-4) * i as f64 / 15.0).collect();
        xs.extend(crate::fit::breakpoint::linspace(x0, 3.0 * x0, 10));
        let rows = xs
            .iter()
            .zip(NOISE.iter())
            .map(|(&x, &e)| vec![x, cmc_model(x, &TRUE_PARAMS) + e])
            .collect();
        PointMatrix::new(rows).unwrap()
    }

    #[test]
    fn recovers_cmc_from_noisy_synthetic_data() {
        let result = fit_cmc(&noisy_surface_tension(), &LmOptions::default()).unwrap();
        let FitDetails::Cmc(params) = &result.details else {
            panic!("unexpected details: {:?}", result.details);
        };
        let rel_err = (params.cmc_value - 0.008).abs() / 0.008;
        assert!(rel_err < 0.05, "cmc={}", params.cmc_value);
        assert!(result.r_squared.unwrap() > 0.99);
        assert_eq!(params.method, CmcMethod::LeastSquares);
        assert!(result.equation.starts_with("CMC ≈ 0.008"));
    }

    #[test]
    fn unsorted_input_gives_the_same_fit() {
        let sorted = noisy_surface_tension();
        let mut rows = sorted.rows().to_vec();
        rows.reverse();
        let shuffled = PointMatrix::new(rows).unwrap();
        let a = fit_cmc(&sorted, &LmOptions::default()).unwrap();
        let b = fit_cmc(&shuffled, &LmOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fewer_than_five_points_is_rejected() {
        let points =
            PointMatrix::from_pairs(&[(0.0, 72.0), (0.001, 60.0), (0.002, 50.0), (0.003, 50.0)])
                .unwrap();
        let err = fit_cmc(&points, &LmOptions::default()).unwrap_err();
        assert!(matches!(err, FitError::Validation(_)));
    }

    #[test]
    fn exhausted_budget_is_a_convergence_error() {
        let opts = LmOptions {
            max_evals: 3,
            ..LmOptions::default()
        };
        let err = fit_cmc(&noisy_surface_tension(), &opts).unwrap_err();
        assert!(matches!(err, FitError::Convergence(_)));
    }

    #[test]
    fn equations_render_signs_and_plateau() {
        let data = CmcData::prepare(&noisy_surface_tension()).unwrap();
        let result = cmc_result(&data, &TRUE_PARAMS, CmcMethod::GradientDescent);
        let FitDetails::Cmc(params) = &result.details else {
            panic!("unexpected details");
        };
        assert_eq!(params.equation_pre_cmc, "γ = 72.0000 − 30.0000·ln(1 + 500.0000·x)");
        assert_eq!(params.equation_post_cmc, format!("γ = {:.4}", 72.0 - 30.0 * 5f64.ln()));
        assert!(result.description.contains("gradient descent"));
    }

    #[test]
    fn general_format_matches_printf_g() {
        assert_eq!(format_general(0.008, 4), "0.008");
        assert_eq!(format_general(0.0080269, 4), "0.008027");
        assert_eq!(format_general(123456.0, 4), "1.235e5");
        assert_eq!(format_general(0.00001234, 4), "1.234e-5");
        assert_eq!(format_general(12.5, 4), "12.5");
    }
}
