//! Breakpoint grid search.
//!
//! Candidates are scored by how well the points at and beyond them are explained
//! by a constant. The best constant for a segment is its mean, so the score
//! (residual sum of squares about the mean) is closed-form and the whole search
//! is O(n·k) without any optimizer call.
//!
//! Why grid search?
//! - It is deterministic given the same inputs.
//! - It gives the nonlinear refinement a seed that is already in the right
//!   region of the breakpoint axis.

use crate::error::FitError;

/// Minimum number of points a breakpoint search accepts.
pub const MIN_POINTS: usize = 5;

/// Extreme points excluded at each end when drawing data-derived candidates.
const EDGE_SKIP: usize = 2;

/// Upper bound on evenly spaced candidates added to the data-derived ones.
const MAX_LINSPACE: usize = 50;

/// Minimum number of points at or beyond a candidate for it to be scored.
const MIN_RIGHT_POINTS: usize = 2;

/// Winning candidate of a breakpoint search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakpointEstimate {
    pub x0: f64,
    /// Residual sum of squares of the right segment about its mean.
    pub rss: f64,
}

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
pub fn linspace(min: f64, max: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (steps as f64 - 1.0);
            (0..steps)
                .map(|i| if i + 1 == steps { max } else { min + step * i as f64 })
                .collect()
        }
    }
}

/// Candidate breakpoints for x-sorted data of length `n >= MIN_POINTS`.
///
/// Interior data values (indices `2..n-2`) united with `min(50, n)` evenly
/// spaced values over `[x[2], x[n-2]]`, sorted ascending without duplicates.
pub fn breakpoint_candidates(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    if n < MIN_POINTS {
        return Vec::new();
    }
    let mut out: Vec<f64> = x[EDGE_SKIP..n - EDGE_SKIP].to_vec();
    out.extend(linspace(x[EDGE_SKIP], x[n - EDGE_SKIP], MAX_LINSPACE.min(n)));
    out.sort_by(|a, b| a.total_cmp(b));
    out.dedup();
    out
}

/// Score one candidate: RSS of `{y_i : x_i >= x0}` about its mean.
///
/// `None` when fewer than two points lie at or beyond `x0`.
pub fn plateau_rss(x: &[f64], y: &[f64], x0: f64) -> Option<f64> {
    let right: Vec<f64> = x
        .iter()
        .zip(y)
        .filter(|(xi, _)| **xi >= x0)
        .map(|(_, yi)| *yi)
        .collect();
    if right.len() < MIN_RIGHT_POINTS {
        return None;
    }
    Some(crate::math::sum_sq_dev(&right))
}

/// Find the breakpoint beyond which the data is best described by a plateau.
///
/// `x` must be sorted ascending. Ties keep the smallest candidate.
pub fn search_breakpoint(x: &[f64], y: &[f64]) -> Result<BreakpointEstimate, FitError> {
    if x.len() != y.len() {
        return Err(FitError::validation("Breakpoint search needs paired data."));
    }
    if x.len() < MIN_POINTS {
        return Err(FitError::validation(format!(
            "Need at least {MIN_POINTS} data points to search for a breakpoint."
        )));
    }

    let mut best: Option<BreakpointEstimate> = None;
    for x0 in breakpoint_candidates(x) {
        let Some(rss) = plateau_rss(x, y, x0) else {
            continue;
        };
        if best.is_none_or(|b| rss < b.rss) {
            best = Some(BreakpointEstimate { x0, rss });
        }
    }

    let best = best.ok_or_else(|| {
        FitError::validation("No breakpoint candidate has enough points beyond it.")
    })?;
    log::debug!("breakpoint search: x0={:.6e} rss={:.6e}", best.x0, best.rss);
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_includes_endpoints() {
        let v = linspace(0.1, 10.0, 5);
        assert_eq!(v.len(), 5);
        assert!((v[0] - 0.1).abs() < 1e-12);
        assert_eq!(v[4], 10.0);
    }

    #[test]
    fn candidates_are_sorted_unique_and_interior() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let c = breakpoint_candidates(&x);
        assert!(c.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(c[0], 2.0);
        assert_eq!(*c.last().unwrap(), 8.0);
        assert!(c.contains(&7.0));
    }

    #[test]
    fn finds_breakpoint_within_one_grid_step() {
        // Decreasing until index 6, flat afterwards.
        let x: Vec<f64> = (0..12).map(|i| 0.5 * i as f64).collect();
        let k = 6;
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, xi)| if i < k { 10.0 - 1.5 * xi } else { 10.0 - 1.5 * x[k] })
            .collect();
        let est = search_breakpoint(&x, &y).unwrap();
        assert!(est.x0 > x[k - 1] && est.x0 <= x[k], "x0={}", est.x0);
        assert_eq!(est.rss, 0.0);
    }

    #[test]
    fn too_few_points_is_a_validation_error() {
        let err = search_breakpoint(&[1.0, 2.0, 3.0, 4.0], &[1.0, 1.0, 1.0, 1.0]).unwrap_err();
        assert!(matches!(err, FitError::Validation(_)));
    }
}
