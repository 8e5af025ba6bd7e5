//! Input/output helpers.
//!
//! - CSV / JSON request ingest (`ingest`)
//! - JSON exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
