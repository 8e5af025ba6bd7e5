//! Data sources that are not user input: synthetic benchmark sets.

pub mod synthetic;

pub use synthetic::CmcScenario;
