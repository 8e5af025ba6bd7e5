//! Error types.
//!
//! Estimators report failures as [`FitError`], one variant per caller-visible
//! category. The binary works in terms of [`AppError`], which carries the process
//! exit code alongside the message.

/// Failure categories produced by the fitting core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// Structural precondition failure (too few points, bad row width, ...).
    #[error("{0}")]
    Validation(String),

    /// Numerically degenerate input, e.g. all x-values identical in a line fit.
    #[error("{0}")]
    DegenerateInput(String),

    /// A nonlinear solver did not converge or produced an invalid result.
    #[error("{0}")]
    Convergence(String),

    /// The mode string is not part of the catalog.
    #[error("Unknown fitting mode: '{mode}'{}", hint_suffix(.hint))]
    UnknownMode {
        mode: String,
        hint: Option<&'static str>,
    },
}

fn hint_suffix(hint: &Option<&'static str>) -> String {
    hint.map(|h| format!(" ({h})")).unwrap_or_default()
}

impl FitError {
    pub fn validation(message: impl Into<String>) -> Self {
        FitError::Validation(message.into())
    }

    pub fn unknown_mode(mode: impl Into<String>) -> Self {
        FitError::UnknownMode {
            mode: mode.into(),
            hint: None,
        }
    }

    /// Short category name, used in logs and JSON error payloads.
    pub fn category(&self) -> &'static str {
        match self {
            FitError::Validation(_) => "validation",
            FitError::DegenerateInput(_) => "degenerate_input",
            FitError::Convergence(_) => "fit_convergence",
            FitError::UnknownMode { .. } => "unknown_mode",
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let exit_code = match err {
            FitError::Validation(_) | FitError::UnknownMode { .. } => 2,
            FitError::DegenerateInput(_) => 3,
            FitError::Convergence(_) => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_errors_map_to_distinct_exit_codes() {
        let v: AppError = FitError::validation("too few points").into();
        let d: AppError = FitError::DegenerateInput("all x equal".into()).into();
        let c: AppError = FitError::Convergence("no convergence".into()).into();
        let u: AppError = FitError::unknown_mode("nope").into();
        assert_eq!(v.exit_code(), 2);
        assert_eq!(d.exit_code(), 3);
        assert_eq!(c.exit_code(), 4);
        assert_eq!(u.exit_code(), 2);
        assert_eq!(u.message(), "Unknown fitting mode: 'nope'");
    }

    #[test]
    fn unknown_mode_hint_is_appended() {
        let err = FitError::UnknownMode {
            mode: "waves".into(),
            hint: Some("use waves-rope or waves-sound"),
        };
        assert_eq!(
            err.to_string(),
            "Unknown fitting mode: 'waves' (use waves-rope or waves-sound)"
        );
        assert_eq!(err.category(), "unknown_mode");
    }
}
