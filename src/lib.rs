//! `graphfit` library crate.
//!
//! Curve fitting for undergraduate physics and chemistry lab data: a fixed
//! catalog of experiment modes, each mapped to its estimator, plus table
//! transcription from photos and terminal plots.
//!
//! The binary (`graphfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the dispatcher can sit behind other front-ends (an HTTP service, notebooks)

pub mod app;
pub mod cli;
pub mod data;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod transcribe;
