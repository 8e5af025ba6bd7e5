//! Model functions evaluated by the nonlinear estimators.
//!
//! Numerical notes:
//! - `sinc(β) = sin(β)/β` is replaced by its limit `1` for `|β| < 1e-10`.
//! - The CMC log curve clamps `x` at zero so `ln(1 + c·x)` stays defined for
//!   the tiny negative concentrations transcription noise can produce.

/// Below this `|β|` the sinc quotient is replaced by its limit.
const SINC_EPS: f64 = 1e-10;

/// Smallest breakpoint used when evaluating the plateau.
const X0_FLOOR: f64 = 1e-15;

/// `sin(β)/β` with the removable singularity filled in.
pub fn sinc(beta: f64) -> f64 {
    if beta.abs() < SINC_EPS {
        return 1.0;
    }
    beta.sin() / beta
}

/// Single-slit intensity `I₀·sinc²(α(θ − θ₀))`.
pub fn sinc_squared_intensity(theta: f64, i0: f64, alpha: f64, theta0: f64) -> f64 {
    let s = sinc(alpha * (theta - theta0));
    i0 * s * s
}

/// Pre-breakpoint curve `a + b·ln(1 + c·x)`.
pub fn log_curve(x: f64, a: f64, b: f64, c: f64) -> f64 {
    a + b * (1.0 + c * x.max(0.0)).ln()
}

/// Plateau value of the continuous CMC model: the log curve evaluated at `x0`.
pub fn cmc_plateau(a: f64, b: f64, c: f64, x0: f64) -> f64 {
    a + b * (1.0 + c * x0.max(X0_FLOOR)).ln()
}

/// Continuous piecewise CMC model.
///
/// `params = [a, b, c, x0]`; log curve below `x0`, constant plateau from `x0` on.
pub fn cmc_model(x: f64, params: &[f64]) -> f64 {
    let (a, b, c, x0) = (params[0], params[1], params[2], params[3]);
    if x < x0 {
        log_curve(x, a, b, c)
    } else {
        cmc_plateau(a, b, c, x0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sinc_limit_at_zero() {
        assert_eq!(sinc(0.0), 1.0);
        assert_eq!(sinc(1e-12), 1.0);
        assert!((sinc(std::f64::consts::PI)).abs() < 1e-15);
    }

    #[test]
    fn intensity_peaks_at_center() {
        let peak = sinc_squared_intensity(0.2, 50.0, 10.0, 0.2);
        assert_eq!(peak, 50.0);
        assert!(sinc_squared_intensity(0.3, 50.0, 10.0, 0.2) < peak);
    }

    #[test]
    fn cmc_model_is_continuous_at_breakpoint() {
        let p = [72.0, -30.0, 500.0, 0.008];
        let left = cmc_model(0.008 - 1e-12, &p);
        let right = cmc_model(0.008, &p);
        assert!((left - right).abs() < 1e-6);
        assert_eq!(cmc_model(0.02, &p), right);
    }
}
