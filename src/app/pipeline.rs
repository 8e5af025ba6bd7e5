//! Shared "fit pipeline" logic used by the `fit` subcommand.
//!
//! request ingest -> dispatcher configured from `FitConfig` -> response

use crate::dispatch::{CmcOptions, FitDispatcher};
use crate::domain::{FitConfig, FitRequest, FitResponse, Mode};
use crate::error::AppError;
use crate::fit::adam::{AdamOptions, MultiStartOptions};
use crate::fit::lm::LmOptions;
use crate::io::ingest::load_request;
use crate::plot::AsciiPlotter;

/// All computed outputs of a single `graphfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub mode: Mode,
    pub response: FitResponse,
}

/// Configure a dispatcher from the command-line settings.
pub fn build_dispatcher(config: &FitConfig) -> FitDispatcher {
    let lm = LmOptions {
        max_evals: config.max_evals,
        ..LmOptions::default()
    };
    let multi_start = MultiStartOptions {
        adam: AdamOptions {
            learning_rate: config.learning_rate,
            max_iters: config.max_iters,
            ..AdamOptions::default()
        },
        seed: config.seed,
        ..MultiStartOptions::default()
    };

    let dispatcher = FitDispatcher::new().with_lm(lm).with_cmc(CmcOptions {
        method: config.cmc_method,
        multi_start,
    });
    if config.plot {
        dispatcher.with_plotter(Box::new(AsciiPlotter::new(config.plot_width, config.plot_height)))
    } else {
        dispatcher
    }
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let request = load_request(config)?;
    run_fit_with_request(config, &request)
}

/// Execute the pipeline on a request that is already in memory.
pub fn run_fit_with_request(config: &FitConfig, request: &FitRequest) -> Result<RunOutput, AppError> {
    let response = build_dispatcher(config).dispatch(request).map_err(|e| {
        if let Some(fit) = e.fit_error() {
            log::warn!("fit failed while {} [{}]", e.stage, fit.category());
        }
        AppError::from(e)
    })?;
    let mode: Mode = request.mode.parse()?;
    Ok(RunOutput { mode, response })
}
