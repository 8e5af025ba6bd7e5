//! Synthetic surface-tension data with a known CMC.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::PointMatrix;
use crate::error::AppError;
use crate::fit::breakpoint::linspace;
use crate::math::cmc_model;

/// Ground truth and sampling plan for a synthetic CMC curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CmcScenario {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub cmc: f64,
    /// Points below the CMC, evenly spaced from 1e-4 (CMC excluded).
    pub n_pre: usize,
    /// Points from the CMC to three times the CMC.
    pub n_post: usize,
    /// Standard deviation of the additive Gaussian noise.
    pub noise: f64,
    pub seed: u64,
}

impl Default for CmcScenario {
    fn default() -> Self {
        Self {
            a: 72.0,
            b: -30.0,
            c: 500.0,
            cmc: 0.008,
            n_pre: 15,
            n_post: 10,
            noise: 0.1,
            seed: 42,
        }
    }
}

impl CmcScenario {
    pub fn params(&self) -> [f64; 4] {
        [self.a, self.b, self.c, self.cmc]
    }

    /// Concentrations before noise is applied.
    pub fn concentrations(&self) -> Vec<f64> {
        let start = 1e-4;
        let mut xs: Vec<f64> = (0..self.n_pre)
            .map(|i| start + (self.cmc - start) * i as f64 / self.n_pre as f64)
            .collect();
        xs.extend(linspace(self.cmc, 3.0 * self.cmc, self.n_post));
        xs
    }

    /// Draw one noisy data set; the same seed always gives the same points.
    pub fn generate(&self) -> Result<PointMatrix, AppError> {
        if !(self.cmc.is_finite() && self.cmc > 1e-4) {
            return Err(AppError::new(2, "Synthetic CMC must be greater than 1e-4."));
        }
        if self.n_pre + self.n_post < 5 {
            return Err(AppError::new(2, "Synthetic data needs at least 5 points."));
        }
        let normal = Normal::new(0.0, self.noise)
            .map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let params = self.params();

        let rows = self
            .concentrations()
            .into_iter()
            .map(|x| vec![x, cmc_model(x, &params) + normal.sample(&mut rng)])
            .collect();
        PointMatrix::new(rows).map_err(AppError::from)
    }
}
