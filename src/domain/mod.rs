//! Shared domain types: modes, point matrices, requests and fit results.

pub mod mode;
pub mod result;
pub mod types;

pub use mode::*;
pub use result::*;
pub use types::*;
