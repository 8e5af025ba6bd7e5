//! Bounded Levenberg–Marquardt for small curve-fitting problems.
//!
//! Given a scalar model `f(x, p)` and observations `(x_i, y_i)` we minimize
//! `Σ (f(x_i, p) − y_i)²` subject to box bounds on `p`.
//!
//! Implementation notes:
//! - The Jacobian is estimated by forward differences with a step of
//!   `sqrt(ε)·max(|p_j|, 1)`, taken backwards when the forward step would leave
//!   the upper bound.
//! - Damping uses Marquardt scaling (`λ·diag(JᵀJ)`), and each step is solved as
//!   an augmented least-squares system (see [`crate::math::ols`]).
//! - Bounds are enforced by projecting every trial point onto the box.
//! - Every residual-vector evaluation counts against `max_evals`, which is the
//!   only budget the caller needs to bound latency.

use nalgebra::{DMatrix, DVector};

use crate::math::solve_least_squares;

const SQRT_EPS: f64 = 1.490_116_119_384_765_6e-8;
const MIN_DIAG: f64 = 1e-12;
const LAMBDA_UP: f64 = 10.0;
const LAMBDA_DOWN: f64 = 0.1;
const LAMBDA_MIN: f64 = 1e-15;
const LAMBDA_MAX: f64 = 1e16;

/// Solver settings.
#[derive(Debug, Clone)]
pub struct LmOptions {
    /// Maximum number of residual-vector evaluations.
    pub max_evals: usize,
    /// Relative cost reduction below which an accepted step ends the run.
    pub ftol: f64,
    /// Relative step length below which an accepted step ends the run.
    pub xtol: f64,
    /// Gradient infinity-norm below which the current point is accepted.
    pub gtol: f64,
    pub initial_lambda: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evals: 20_000,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-12,
            initial_lambda: 1e-3,
        }
    }
}

/// Box constraints `lower <= p <= upper` (infinite entries allowed).
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self { lower, upper }
    }

    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; n],
            upper: vec![f64::INFINITY; n],
        }
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Project `params` onto the box in place.
    pub fn clamp(&self, params: &mut [f64]) {
        for ((p, lo), hi) in params.iter_mut().zip(&self.lower).zip(&self.upper) {
            *p = p.max(*lo).min(*hi);
        }
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    GradientTolerance,
    CostTolerance,
    StepTolerance,
    /// No damping level produced a descent step; the point is a local minimum
    /// to machine precision.
    DampingSaturated,
    EvaluationLimit,
    NonFinite,
}

impl Termination {
    pub fn converged(self) -> bool {
        !matches!(self, Termination::EvaluationLimit | Termination::NonFinite)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LmReport {
    pub params: Vec<f64>,
    /// Sum of squared residuals at `params`.
    pub cost: f64,
    pub evaluations: usize,
    pub iterations: usize,
    pub termination: Termination,
}

impl LmReport {
    pub fn converged(&self) -> bool {
        self.termination.converged() && self.cost.is_finite()
    }
}

/// Minimize the squared residuals of `model` against `(x, y)` within `bounds`.
pub fn levenberg_marquardt<F>(
    model: F,
    x: &[f64],
    y: &[f64],
    initial: &[f64],
    bounds: &Bounds,
    opts: &LmOptions,
) -> LmReport
where
    F: Fn(f64, &[f64]) -> f64,
{
    let n_params = initial.len();
    let n_obs = x.len();

    let residuals = |p: &[f64]| -> Vec<f64> {
        x.iter().zip(y).map(|(&xi, &yi)| model(xi, p) - yi).collect()
    };
    let cost_of = |r: &[f64]| -> f64 { r.iter().map(|v| v * v).sum() };

    let mut params = initial.to_vec();
    bounds.clamp(&mut params);
    let mut r = residuals(&params);
    let mut cost = cost_of(&r);
    let mut evaluations = 1usize;
    let mut iterations = 0usize;
    let mut lambda = opts.initial_lambda;

    let report = |params: Vec<f64>, cost: f64, evaluations, iterations, termination| LmReport {
        params,
        cost,
        evaluations,
        iterations,
        termination,
    };

    if !cost.is_finite() {
        return report(params, cost, evaluations, iterations, Termination::NonFinite);
    }

    while evaluations < opts.max_evals {
        iterations += 1;

        // Forward-difference Jacobian of the residual vector.
        let mut jac = DMatrix::<f64>::zeros(n_obs, n_params);
        for j in 0..n_params {
            let mut h = SQRT_EPS * params[j].abs().max(1.0);
            if params[j] + h > bounds.upper[j] {
                h = -h;
            }
            let mut shifted = params.clone();
            shifted[j] += h;
            let rj = residuals(&shifted);
            evaluations += 1;
            for i in 0..n_obs {
                jac[(i, j)] = (rj[i] - r[i]) / h;
            }
        }

        let r_vec = DVector::from_column_slice(&r);
        let grad = jac.transpose() * &r_vec;
        if grad.amax() < opts.gtol {
            return report(params, cost, evaluations, iterations, Termination::GradientTolerance);
        }
        let diag: Vec<f64> = (0..n_params)
            .map(|j| jac.column(j).norm_squared().max(MIN_DIAG))
            .collect();

        loop {
            if evaluations >= opts.max_evals {
                return report(params, cost, evaluations, iterations, Termination::EvaluationLimit);
            }

            let mut aug = DMatrix::<f64>::zeros(n_obs + n_params, n_params);
            aug.view_mut((0, 0), (n_obs, n_params)).copy_from(&jac);
            for j in 0..n_params {
                aug[(n_obs + j, j)] = (lambda * diag[j]).sqrt();
            }
            let mut rhs = DVector::<f64>::zeros(n_obs + n_params);
            for i in 0..n_obs {
                rhs[i] = -r[i];
            }

            if let Some(delta) = solve_least_squares(&aug, &rhs) {
                let mut trial: Vec<f64> = params.iter().zip(delta.iter()).map(|(p, d)| p + d).collect();
                bounds.clamp(&mut trial);
                let r_trial = residuals(&trial);
                let cost_trial = cost_of(&r_trial);
                evaluations += 1;

                if cost_trial.is_finite() && cost_trial < cost {
                    let step = trial
                        .iter()
                        .zip(&params)
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum::<f64>()
                        .sqrt();
                    let p_norm = params.iter().map(|v| v * v).sum::<f64>().sqrt();
                    let reduction = (cost - cost_trial) / cost.max(f64::MIN_POSITIVE);

                    params = trial;
                    r = r_trial;
                    cost = cost_trial;
                    lambda = (lambda * LAMBDA_DOWN).max(LAMBDA_MIN);

                    if reduction < opts.ftol {
                        return report(params, cost, evaluations, iterations, Termination::CostTolerance);
                    }
                    if step <= opts.xtol * (opts.xtol + p_norm) {
                        return report(params, cost, evaluations, iterations, Termination::StepTolerance);
                    }
                    break;
                }
            }

            lambda *= LAMBDA_UP;
            if lambda > LAMBDA_MAX {
                return report(params, cost, evaluations, iterations, Termination::DampingSaturated);
            }
        }

        log::trace!("lm iteration {iterations}: cost={cost:.6e} lambda={lambda:.1e}");
    }

    report(params, cost, evaluations, iterations, Termination::EvaluationLimit)
}
