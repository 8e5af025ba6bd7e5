//! Side-by-side benchmark of the two CMC estimators on synthetic data.

use std::time::{Duration, Instant};

use crate::data::CmcScenario;
use crate::dispatch::{CmcOptions, FitDispatcher};
use crate::domain::{CmcMethod, FitDetails, Mode};
use crate::error::AppError;
use crate::report::format::format_table;

/// One estimator run at one noise level.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub noise: f64,
    pub method: CmcMethod,
    /// `(cmc, r_squared)` on success, the error message otherwise.
    pub outcome: Result<(f64, f64), String>,
    pub elapsed: Duration,
}

impl ComparisonRow {
    pub fn abs_error(&self, true_cmc: f64) -> Option<f64> {
        self.outcome.as_ref().ok().map(|(cmc, _)| (cmc - true_cmc).abs())
    }
}

/// Fit `scenario` at every noise level with both estimators.
///
/// Level `i` draws its noise from `scenario.seed + i`, so the two estimators
/// always see identical data.
pub fn run_comparison(
    scenario: &CmcScenario,
    noise_levels: &[f64],
    cmc: &CmcOptions,
) -> Result<Vec<ComparisonRow>, AppError> {
    let mut rows = Vec::with_capacity(noise_levels.len() * 2);
    for (i, &noise) in noise_levels.iter().enumerate() {
        let data = CmcScenario {
            noise,
            seed: scenario.seed.wrapping_add(i as u64),
            ..scenario.clone()
        }
        .generate()?;

        for method in [CmcMethod::LeastSquares, CmcMethod::GradientDescent] {
            let dispatcher = FitDispatcher::new().with_cmc(CmcOptions {
                method,
                ..cmc.clone()
            });
            let start = Instant::now();
            let result = dispatcher.fit(Mode::Cmc, &data, &[]);
            let elapsed = start.elapsed();

            let outcome = match result {
                Ok(fit) => match fit.details {
                    FitDetails::Cmc(p) => Ok((p.cmc_value, fit.r_squared.unwrap_or(f64::NAN))),
                    _ => Err("unexpected result shape".to_string()),
                },
                Err(e) => Err(e.to_string()),
            };
            log::debug!("compare: noise={noise} method={method:?} elapsed={elapsed:?}");
            rows.push(ComparisonRow {
                noise,
                method,
                outcome,
                elapsed,
            });
        }
    }
    Ok(rows)
}

/// Render the comparison as a fixed-width table.
pub fn format_comparison(rows: &[ComparisonRow], true_cmc: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!("CMC estimator comparison (true CMC = {true_cmc})\n\n"));

    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            let name = format!("σ={} {}", r.noise, method_short(r.method));
            let ms = format!("{:.1}", r.elapsed.as_secs_f64() * 1000.0);
            match &r.outcome {
                Ok((cmc, r2)) => {
                    let abs = (cmc - true_cmc).abs();
                    vec![
                        name,
                        format!("{cmc:.6}"),
                        format!("{abs:.6}"),
                        format!("{:.2}", 100.0 * abs / true_cmc),
                        format!("{r2:.8}"),
                        ms,
                    ]
                }
                Err(msg) => {
                    log::warn!("compare: {name} failed: {msg}");
                    vec![name, "FAILED".into(), "-".into(), "-".into(), "-".into(), ms]
                }
            }
        })
        .collect();

    out.push_str(&format_table(
        &["run", "CMC found", "abs error", "error %", "R²", "time [ms]"],
        &body,
    ));
    out
}

fn method_short(method: CmcMethod) -> &'static str {
    match method {
        CmcMethod::LeastSquares => "lm",
        CmcMethod::GradientDescent => "adam",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_marks_failures_and_reports_percent_error() {
        let rows = vec![
            ComparisonRow {
                noise: 0.1,
                method: CmcMethod::LeastSquares,
                outcome: Ok((0.0082, 0.9999)),
                elapsed: Duration::from_millis(3),
            },
            ComparisonRow {
                noise: 0.1,
                method: CmcMethod::GradientDescent,
                outcome: Err("did not converge".into()),
                elapsed: Duration::from_millis(40),
            },
        ];
        let txt = format_comparison(&rows, 0.008);
        assert!(txt.contains("σ=0.1 lm"));
        assert!(txt.contains("2.50"));
        assert!(txt.contains("FAILED"));
        assert!((rows[0].abs_error(0.008).unwrap() - 0.0002).abs() < 1e-12);
        assert!(rows[1].abs_error(0.008).is_none());
    }

    #[test]
    fn both_estimators_run_on_identical_data() {
        let rows = run_comparison(&CmcScenario::default(), &[0.1], &CmcOptions::default()).unwrap();
        assert_eq!(rows.len(), 2);
        for r in &rows {
            let (cmc, r2) = r.outcome.clone().unwrap();
            assert!((cmc - 0.008).abs() / 0.008 < 0.1, "{:?} cmc={cmc}", r.method);
            assert!(r2 > 0.99);
        }
    }
}
