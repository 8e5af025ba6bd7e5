//! Fit results.
//!
//! A [`FitResult`] always serializes `equation`, `description` and
//! `r_squared` (possibly `null`), with the model-specific fields flattened next
//! to them. The plotter keys on those field names (`cmc_value`,
//! `transformed_points`, `series_fits`, ...), so they are part of the contract.

use serde::Serialize;

use crate::domain::CmcMethod;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub equation: String,
    pub description: String,
    pub r_squared: Option<f64>,
    #[serde(flatten)]
    pub details: FitDetails,
}

/// Model-specific payload of a fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FitDetails {
    /// `y = slope·x + intercept` on the raw data (straight line, polarization).
    Line(LineParams),
    /// Line fitted after a variable transform (Newton's rings).
    Transformed(TransformedLine),
    Cmc(CmcParams),
    Planck(PlanckParams),
    Diffraction(DiffractionParams),
    SoundWave(SoundWaveParams),
    StoppingPotentials { series_fits: Vec<StoppingPotential> },
    Damped { series_fits: Vec<DampedSeriesFit> },
    Resonances { series_fits: Vec<Resonance> },
    WaveGroups { series_fits: Vec<WaveGroupFit> },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineParams {
    pub slope: f64,
    pub intercept: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformedLine {
    pub slope: f64,
    pub intercept: f64,
    pub transformed_points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CmcParams {
    pub cmc_value: f64,
    pub cmc_surface_tension: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub equation_pre_cmc: String,
    pub equation_post_cmc: String,
    pub method: CmcMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanckParams {
    pub slope: f64,
    pub intercept: f64,
    /// Unit the frequency column was interpreted in (`Hz` or `THz`).
    pub frequency_unit: String,
    pub planck_constant: f64,
    pub accepted_planck_constant: f64,
    pub percent_error: f64,
    /// Work function in eV (`−intercept` of the V–ν line).
    pub work_function_ev: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiffractionParams {
    pub i0: f64,
    pub alpha: f64,
    pub theta0: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoundWaveParams {
    pub velocity: f64,
    pub intercept: f64,
    pub transformed_points: Vec<[f64; 2]>,
}

/// How a stopping potential was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingMethod {
    /// Linear interpolation across the first sign change.
    Interpolated,
    /// A sample with current exactly zero.
    Exact,
    /// No sign change; the sample with the smallest |I|.
    NearestToZero,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoppingPotential {
    pub label: String,
    pub stopping_potential: f64,
    pub method: CrossingMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DampedSeriesFit {
    pub label: String,
    pub damping_constant: f64,
    pub initial_amplitude: f64,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub points_used: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resonance {
    pub label: String,
    pub resonance_frequency: f64,
    pub peak_amplitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveGroupFit {
    pub label: String,
    pub group: f64,
    pub velocity: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub transformed_points: Vec<[f64; 2]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_are_flattened_next_to_common_fields() {
        let result = FitResult {
            equation: "y = 2.0000x + 1.0000".into(),
            description: "line".into(),
            r_squared: Some(1.0),
            details: FitDetails::Line(LineParams {
                slope: 2.0,
                intercept: 1.0,
            }),
        };
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["slope"], 2.0);
        assert_eq!(v["intercept"], 1.0);
        assert_eq!(v["r_squared"], 1.0);
    }

    #[test]
    fn missing_r_squared_serializes_as_null() {
        let result = FitResult {
            equation: "peaks".into(),
            description: "resonance".into(),
            r_squared: None,
            details: FitDetails::Resonances {
                series_fits: vec![Resonance {
                    label: "I_d = 1".into(),
                    resonance_frequency: 0.5,
                    peak_amplitude: 12.0,
                }],
            },
        };
        let v = serde_json::to_value(&result).unwrap();
        assert!(v["r_squared"].is_null());
        assert_eq!(v["series_fits"][0]["resonance_frequency"], 0.5);
    }
}
