//! Estimators.
//!
//! Responsibilities:
//!
//! - closed-form straight-line fits
//! - breakpoint grid search for piecewise data
//! - bounded Levenberg–Marquardt refinement
//! - the two CMC estimators (least squares and multi-start Adam)

pub mod adam;
pub mod breakpoint;
pub mod cmc;
pub mod linear;
pub mod lm;

pub use adam::{AdamOptions, MultiStartOptions, fit_cmc_gradient_descent};
pub use breakpoint::{BreakpointEstimate, search_breakpoint};
pub use cmc::{CmcData, fit_cmc, format_general};
pub use linear::{LineFit, fit_line, fit_line_pairs, format_line_equation};
pub use lm::{Bounds, LmOptions, LmReport, Termination, levenberg_marquardt};
