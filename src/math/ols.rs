//! Least squares solve for small dense systems.
//!
//! The Levenberg–Marquardt step is computed as the least-squares solution of the
//! augmented system
//!
//! ```text
//! [      J       ] δ ≈ [ −r ]
//! [ sqrt(λ·D)    ]     [  0 ]
//! ```
//!
//! which is equivalent to the damped normal equations `(JᵀJ + λD) δ = −Jᵀr`
//! but better conditioned. Parameter counts are tiny (3–4 columns), so SVD cost
//! is negligible.

use nalgebra::{DMatrix, DVector};

/// Minimum-norm least-squares solution via SVD.
///
/// Singular values below the tolerance are truncated; `None` only when no
/// tolerance yields a finite solution.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn augmented_system_matches_damped_normal_equations() {
        // J = [1 0; 1 1; 1 2], -r = [2, 5, 8], λ = 0.5, D = diag(JᵀJ) = [3, 5].
        // (JᵀJ + λD) δ = Jᵀ(-r) gives δ = [2, 2].
        let lambda: f64 = 0.5;
        let x = DMatrix::from_row_slice(
            5,
            2,
            &[
                1.0,
                0.0,
                1.0,
                1.0,
                1.0,
                2.0,
                (lambda * 3.0).sqrt(),
                0.0,
                0.0,
                (lambda * 5.0).sqrt(),
            ],
        );
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0, 0.0, 0.0]);

        let delta = solve_least_squares(&x, &y).unwrap();
        assert!((delta[0] - 2.0).abs() < 1e-10);
        assert!((delta[1] - 2.0).abs() < 1e-10);
    }
}
