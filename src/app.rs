//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - loads fit requests and runs the dispatcher
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use crate::cli::{Cli, Command, CompareArgs, ExtractArgs, FitArgs};
use crate::data::CmcScenario;
use crate::dispatch::CmcOptions;
use crate::domain::{FitConfig, Mode};
use crate::error::AppError;
use crate::io::export::{to_json_string, write_json};
use crate::transcribe::{ImageUpload, TableTranscriber, VisionClient};

pub mod pipeline;

/// Entry point for the `graphfit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Fit(args) => handle_fit(&args),
        Command::Extract(args) => handle_extract(&args),
        Command::Compare(args) => handle_compare(&args),
        Command::Modes => handle_modes(),
    }
}

fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = log_level(verbose, quiet);
    if TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto).is_err() {
        eprintln!("warning: logger already initialized");
    }
}

fn handle_fit(args: &FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(args);
    let run = pipeline::run_fit(&config)?;

    if config.json {
        println!("{}", to_json_string(&run.response)?);
    } else {
        println!("{}", crate::report::format_fit_summary(run.mode, &run.response.fit_params));
        if let Some(plot) = &run.response.graph_image {
            println!("{plot}");
        }
    }

    if let Some(path) = &config.export {
        write_json(path, &run.response)?;
    }
    Ok(())
}

fn handle_extract(args: &ExtractArgs) -> Result<(), AppError> {
    let mode: Mode = args.mode.parse()?;
    let image = ImageUpload::from_path(&args.image)?;
    image.validate()?;

    let client = VisionClient::from_env()?;
    log::info!("transcribing {} with {}", args.image.display(), client.model());
    let table = client.transcribe(&image, mode)?;

    match &args.output {
        Some(path) => write_json(path, &table)?,
        None => println!("{}", to_json_string(&table)?),
    }
    Ok(())
}

fn handle_compare(args: &CompareArgs) -> Result<(), AppError> {
    if args.noise.is_empty() {
        return Err(AppError::new(2, "Pass at least one noise level."));
    }
    let scenario = CmcScenario {
        seed: args.seed,
        ..CmcScenario::default()
    };
    let rows = crate::report::run_comparison(&scenario, &args.noise, &CmcOptions::default())?;
    println!("{}", crate::report::format_comparison(&rows, scenario.cmc));
    Ok(())
}

fn handle_modes() -> Result<(), AppError> {
    println!("{}", format_modes());
    Ok(())
}

fn format_modes() -> String {
    let mut out = format!("{:<20} {:<26} {}\n", "mode", "rows", "experiment");
    for m in Mode::ALL {
        out.push_str(&format!("{:<20} {:<26} {}\n", m.as_str(), m.shape().describe(), m.display_name()));
    }
    out
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        mode: args.mode.clone(),
        input: args.input.clone(),
        columns: args.columns.clone(),
        cmc_method: args.cmc_method,
        seed: args.seed,
        learning_rate: args.learning_rate,
        max_iters: args.max_iters,
        max_evals: args.max_evals,
        json: args.json,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export: args.export.clone(),
    }
}
