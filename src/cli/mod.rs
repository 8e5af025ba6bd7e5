//! Command-line parsing for the graphfit lab-data fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting code; `app` turns these structs into plain config.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::CmcMethod;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "graphfit", version, about = "Curve fitting for physics and chemistry lab data")]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a data table and print the equation, parameters and a terminal plot.
    Fit(FitArgs),
    /// Transcribe a photographed data table into JSON via the vision service.
    Extract(ExtractArgs),
    /// Benchmark both CMC estimators on synthetic data.
    Compare(CompareArgs),
    /// List the supported fitting modes.
    Modes,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Fitting mode (see `graphfit modes`); overrides the request file.
    #[arg(short, long)]
    pub mode: Option<String>,

    /// CSV (header row + numbers) or JSON request file. Reads JSON from stdin when omitted.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Column names, overriding the file header.
    #[arg(long, value_delimiter = ',')]
    pub columns: Option<Vec<String>>,

    /// CMC estimator.
    #[arg(long, value_enum, default_value_t = CmcMethod::LeastSquares)]
    pub cmc_method: CmcMethod,

    /// Seed for the randomized multi-start of the gradient-descent estimator.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Adam learning rate (normalized parameter space).
    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Adam iterations per start.
    #[arg(long, default_value_t = 5000)]
    pub max_iters: usize,

    /// Levenberg–Marquardt function-evaluation budget.
    #[arg(long, default_value_t = 20000)]
    pub max_evals: usize,

    /// Print the full response as JSON instead of the text report.
    #[arg(long)]
    pub json: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Write the response JSON to this file.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ExtractArgs {
    /// Photo of the data table (png, jpg, webp, ...).
    #[arg(long, value_name = "FILE")]
    pub image: PathBuf,

    /// Fitting mode the table is meant for; selects the column hint.
    #[arg(short, long)]
    pub mode: String,

    /// Write the table JSON here instead of stdout.
    #[arg(short, long, value_name = "JSON")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CompareArgs {
    /// Noise standard deviations to benchmark.
    #[arg(long, value_delimiter = ',', default_values_t = [0.1, 0.5, 1.0, 2.0])]
    pub noise: Vec<f64>,

    /// Base seed; noise level i uses seed + i.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn fit_flags_parse() {
        let cli = Cli::parse_from([
            "graphfit",
            "-vv",
            "fit",
            "--mode",
            "cmc",
            "--input",
            "data.csv",
            "--columns",
            "c,gamma",
            "--cmc-method",
            "adam",
            "--no-plot",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.mode.as_deref(), Some("cmc"));
        assert_eq!(args.columns, Some(vec!["c".to_string(), "gamma".to_string()]));
        assert_eq!(args.cmc_method, CmcMethod::GradientDescent);
        assert!(args.no_plot);
        assert_eq!(args.max_evals, 20000);
    }

    #[test]
    fn compare_defaults_to_four_noise_levels() {
        let cli = Cli::parse_from(["graphfit", "compare"]);
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.noise, vec![0.1, 0.5, 1.0, 2.0]);
        assert_eq!(args.seed, 42);
    }
}
