//! Summary statistics shared by every estimator.

/// Arithmetic mean. `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sum of squared deviations from the mean.
pub fn sum_sq_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum()
}

/// Residual sum of squares between observations and predictions.
pub fn sum_sq_residuals(observed: &[f64], predicted: &[f64]) -> f64 {
    observed
        .iter()
        .zip(predicted.iter())
        .map(|(y, p)| (y - p) * (y - p))
        .sum()
}

/// Coefficient of determination `1 − SS_res/SS_tot`.
///
/// A constant target (`SS_tot == 0`) has no variance to explain; R² is then
/// defined as `0.0` instead of dividing by zero.
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> f64 {
    let ss_tot = sum_sq_dev(observed);
    if ss_tot <= 0.0 {
        return 0.0;
    }
    1.0 - sum_sq_residuals(observed, predicted) / ss_tot
}

/// Median of a slice (sorted copy). `None` when empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn r_squared_is_zero_for_constant_target() {
        let y = [3.0, 3.0, 3.0];
        assert_eq!(r_squared(&y, &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn r_squared_is_one_for_exact_prediction() {
        let y = [1.0, 2.0, 4.0];
        assert!((r_squared(&y, &y) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn median_handles_even_and_odd_lengths() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }
}
