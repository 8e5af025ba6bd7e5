//! Plotting collaborators.
//!
//! The dispatcher only knows the [`Plotter`] trait; the terminal build ships
//! [`AsciiPlotter`]. A plotter receives the original points, the fit, the mode
//! and the series labels, and returns the encoded artifact that ends up in the
//! response's `graphImage` field.

pub mod ascii;

pub use ascii::AsciiPlotter;

use crate::domain::{FitResult, Mode, PointMatrix};
use crate::error::AppError;

/// Everything a plotter may draw from.
#[derive(Debug, Clone, Copy)]
pub struct PlotInput<'a> {
    pub mode: Mode,
    pub points: &'a PointMatrix,
    pub fit: &'a FitResult,
    pub labels: &'a [String],
}

pub trait Plotter: Send + Sync {
    fn render(&self, input: &PlotInput<'_>) -> Result<String, AppError>;
}
