//! Reporting utilities: fit summaries and the estimator comparison table.

pub mod compare;
pub mod format;

pub use compare::{ComparisonRow, format_comparison, run_comparison};
pub use format::format_fit_summary;
