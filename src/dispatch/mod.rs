//! Request dispatch: validate, fit, plot, package.
//!
//! A request moves through `Validating → Fitting → Plotting → Done`; the first
//! error stops it and is reported together with the stage it happened in.
//! Estimator errors are passed through unchanged and no other model is tried.

use std::fmt;

use crate::domain::{
    CmcMethod, FitRequest, FitResponse, FitResult, Mode, PointMatrix, RowShape, series_labels,
};
use crate::error::{AppError, FitError};
use crate::fit::adam::{MultiStartOptions, fit_cmc_gradient_descent};
use crate::fit::cmc::fit_cmc;
use crate::fit::lm::LmOptions;
use crate::models;
use crate::plot::{PlotInput, Plotter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Fitting,
    Plotting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Validating => "validating",
            Stage::Fitting => "fitting",
            Stage::Plotting => "plotting",
            Stage::Done => "done",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchFailure {
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error(transparent)]
    App(#[from] AppError),
}

/// A failed dispatch and the stage it failed in.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct DispatchError {
    pub stage: Stage,
    pub kind: DispatchFailure,
}

impl DispatchError {
    fn new(stage: Stage, kind: impl Into<DispatchFailure>) -> Self {
        Self {
            stage,
            kind: kind.into(),
        }
    }

    /// The underlying estimator/validation error, if that is what failed.
    pub fn fit_error(&self) -> Option<&FitError> {
        match &self.kind {
            DispatchFailure::Fit(e) => Some(e),
            DispatchFailure::App(_) => None,
        }
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err.kind {
            DispatchFailure::Fit(e) => AppError::from(e),
            DispatchFailure::App(e) => e,
        }
    }
}

/// CMC estimator choice and its settings.
#[derive(Debug, Clone, Default)]
pub struct CmcOptions {
    pub method: CmcMethod,
    pub multi_start: MultiStartOptions,
}

/// Validated form of a [`FitRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub mode: Mode,
    pub points: PointMatrix,
    /// One label per series column; empty for single-series modes.
    pub labels: Vec<String>,
}

/// Check a request against its mode's row shape and size rules.
pub fn validate_request(req: &FitRequest) -> Result<ValidatedRequest, FitError> {
    let mode: Mode = req.mode.parse()?;

    if req.points.len() < 2 {
        return Err(FitError::validation("Need at least 2 data points."));
    }

    match mode.shape() {
        RowShape::Pair | RowShape::Grouped => {
            let expected = if mode.shape() == RowShape::Pair { 2 } else { 3 };
            for (i, row) in req.points.iter().enumerate() {
                if row.len() != expected {
                    return Err(FitError::validation(format!(
                        "Row {} must have exactly {expected} values, got {}.",
                        i + 1,
                        row.len()
                    )));
                }
            }
        }
        RowShape::MultiSeries => {
            if req.points[0].len() < 2 {
                return Err(FitError::validation("Need at least 2 columns."));
            }
        }
    }

    // Uniform width and finiteness.
    let points = PointMatrix::new(req.points.clone())?;

    if points.len() < mode.min_rows() {
        return Err(FitError::validation(format!(
            "{} requires at least {} data points.",
            mode.display_name(),
            mode.min_rows()
        )));
    }

    let labels = if mode.is_multi_series() {
        series_labels(mode, &req.columns, points.width())
    } else {
        Vec::new()
    };

    Ok(ValidatedRequest {
        mode,
        points,
        labels,
    })
}

/// Routes validated requests to the estimator for their mode.
pub struct FitDispatcher {
    plotter: Option<Box<dyn Plotter>>,
    cmc: CmcOptions,
    lm: LmOptions,
}

impl Default for FitDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FitDispatcher {
    pub fn new() -> Self {
        Self {
            plotter: None,
            cmc: CmcOptions::default(),
            lm: LmOptions::default(),
        }
    }

    pub fn with_plotter(mut self, plotter: Box<dyn Plotter>) -> Self {
        self.plotter = Some(plotter);
        self
    }

    pub fn with_cmc(mut self, cmc: CmcOptions) -> Self {
        self.cmc = cmc;
        self
    }

    pub fn with_lm(mut self, lm: LmOptions) -> Self {
        self.lm = lm;
        self
    }

    /// Run the estimator for `mode`.
    pub fn fit(&self, mode: Mode, points: &PointMatrix, labels: &[String]) -> Result<FitResult, FitError> {
        match mode {
            Mode::StraightLine => models::fit_straight_line(points),
            Mode::Cmc => {
                log::info!("cmc estimator: {}", self.cmc.method.display_name());
                match self.cmc.method {
                    CmcMethod::LeastSquares => fit_cmc(points, &self.lm),
                    CmcMethod::GradientDescent => fit_cmc_gradient_descent(points, &self.cmc.multi_start),
                }
            }
            Mode::PhotoelectricWavelength | Mode::PhotoelectricDistance => {
                models::fit_stopping_potentials(points, labels)
            }
            Mode::PhotoelectricPlanck => models::fit_planck(points),
            Mode::SingleSlit => models::fit_single_slit(points, &self.lm),
            Mode::NewtonsRings => models::fit_newtons_rings(points),
            Mode::PohlsDamped => models::fit_damped(points, labels),
            Mode::PohlsForced => models::fit_forced(points, labels),
            Mode::Polarization => models::fit_polarization(points),
            Mode::WavesRope => models::fit_rope(points),
            Mode::WavesSound => models::fit_sound(points),
        }
    }

    /// Validate, fit and (optionally) plot one request.
    pub fn dispatch(&self, req: &FitRequest) -> Result<FitResponse, DispatchError> {
        log::info!("dispatch: {}", Stage::Validating);
        let valid = validate_request(req).map_err(|e| DispatchError::new(Stage::Validating, e))?;

        log::info!("dispatch: {} ({} rows, mode {})", Stage::Fitting, valid.points.len(), valid.mode);
        let fit = self
            .fit(valid.mode, &valid.points, &valid.labels)
            .map_err(|e| DispatchError::new(Stage::Fitting, e))?;

        let graph_image = match &self.plotter {
            Some(plotter) => {
                log::info!("dispatch: {}", Stage::Plotting);
                let input = PlotInput {
                    mode: valid.mode,
                    points: &valid.points,
                    fit: &fit,
                    labels: &valid.labels,
                };
                Some(plotter.render(&input).map_err(|e| DispatchError::new(Stage::Plotting, e))?)
            }
            None => None,
        };

        log::info!("dispatch: {}", Stage::Done);
        Ok(FitResponse {
            equation: fit.equation.clone(),
            description: fit.description.clone(),
            points: req.points.clone(),
            columns: req.columns.clone(),
            graph_image,
            fit_params: fit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FitDetails;
    use crate::plot::AsciiPlotter;

    fn request(mode: &str, points: Vec<Vec<f64>>) -> FitRequest {
        FitRequest {
            mode: mode.to_string(),
            points,
            columns: Vec::new(),
        }
    }

    #[test]
    fn unknown_mode_fails_while_validating() {
        let err = FitDispatcher::new()
            .dispatch(&request("not-a-real-mode", vec![vec![1.0, 2.0], vec![2.0, 3.0]]))
            .unwrap_err();
        assert_eq!(err.stage, Stage::Validating);
        assert!(matches!(err.fit_error(), Some(FitError::UnknownMode { .. })));
        assert_eq!(err.to_string(), "Unknown fitting mode: 'not-a-real-mode'");
    }

    #[test]
    fn single_row_is_rejected() {
        let err = validate_request(&request("straight-line", vec![vec![1.0, 2.0]])).unwrap_err();
        assert_eq!(err, FitError::validation("Need at least 2 data points."));
    }

    #[test]
    fn pair_modes_require_exactly_two_values() {
        let err = validate_request(&request("polarization", vec![vec![1.0, 2.0], vec![1.0, 2.0, 3.0]]))
            .unwrap_err();
        assert_eq!(err, FitError::validation("Row 2 must have exactly 2 values, got 3."));
    }

    #[test]
    fn rope_requires_three_values() {
        let err = validate_request(&request("waves-rope", vec![vec![1.0, 2.0], vec![1.0, 3.0]]))
            .unwrap_err();
        assert!(matches!(err, FitError::Validation(_)));
    }

    #[test]
    fn multi_series_rows_must_be_uniform() {
        let err = validate_request(&request(
            "pohls-damped",
            vec![vec![0.0, 1.0, 2.0], vec![1.0, 0.5]],
        ))
        .unwrap_err();
        assert_eq!(err, FitError::validation("Row 2 has 2 values, expected 3."));
    }

    #[test]
    fn cmc_needs_four_rows() {
        let rows = vec![vec![0.001, 70.0], vec![0.002, 60.0], vec![0.003, 50.0]];
        let err = validate_request(&request("cmc", rows)).unwrap_err();
        assert!(matches!(err, FitError::Validation(msg) if msg.contains("at least 4")));
    }

    #[test]
    fn non_finite_values_are_validation_errors() {
        let err = validate_request(&request("straight-line", vec![vec![1.0, f64::INFINITY], vec![2.0, 3.0]]))
            .unwrap_err();
        assert!(matches!(err, FitError::Validation(_)));
    }

    #[test]
    fn labels_default_when_columns_are_missing() {
        let valid = validate_request(&request(
            "photoelectric-1-1",
            vec![vec![0.0, 1.0, 2.0, 3.0], vec![1.0, -1.0, -2.0, -3.0]],
        ))
        .unwrap();
        assert_eq!(valid.labels, vec!["Series 1", "Series 2", "Series 3"]);
    }

    #[test]
    fn degenerate_input_fails_while_fitting() {
        let err = FitDispatcher::new()
            .dispatch(&request("straight-line", vec![vec![5.0, 1.0], vec![5.0, 2.0], vec![5.0, 3.0]]))
            .unwrap_err();
        assert_eq!(err.stage, Stage::Fitting);
        assert!(matches!(err.fit_error(), Some(FitError::DegenerateInput(_))));
    }

    #[test]
    fn response_echoes_request_and_carries_plot() {
        let mut req = request("straight-line", vec![vec![0.0, 1.0], vec![1.0, 3.0], vec![2.0, 5.0]]);
        req.columns = vec!["t".into(), "s".into()];
        let dispatcher = FitDispatcher::new().with_plotter(Box::new(AsciiPlotter::new(20, 6)));
        let resp = dispatcher.dispatch(&req).unwrap();
        assert_eq!(resp.equation, "y = 2.0000x + 1.0000");
        assert_eq!(resp.points, req.points);
        assert_eq!(resp.columns, req.columns);
        assert!(resp.graph_image.unwrap().starts_with("Plot: Straight Line Fit"));
        assert!(matches!(resp.fit_params.details, FitDetails::Line(_)));

        let json = serde_json::to_value(
            FitDispatcher::new().dispatch(&req).unwrap(),
        )
        .unwrap();
        assert!(json["graphImage"].is_null());
        assert_eq!(json["fitParams"]["slope"], 2.0);
    }
}
