//! Mathematical utilities: model functions, summary statistics and a robust
//! least-squares solve.

pub mod functions;
pub mod ols;
pub mod stats;

pub use functions::*;
pub use ols::*;
pub use stats::*;
