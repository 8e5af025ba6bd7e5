//! The fitting-mode catalog.
//!
//! Every mode-keyed decision (row shape, minimum rows, transcription hint,
//! default series labels) is answered here, so the dispatcher, the transcriber
//! and the plotter never keep their own parallel branch lists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Fixed set of supported experiment modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "straight-line")]
    StraightLine,
    #[serde(rename = "cmc")]
    Cmc,
    /// V–I curves, one current column per wavelength.
    #[serde(rename = "photoelectric-1-1")]
    PhotoelectricWavelength,
    /// Stopping voltage against frequency (Planck's constant).
    #[serde(rename = "photoelectric-1-2")]
    PhotoelectricPlanck,
    /// V–I curves, one current column per lamp distance.
    #[serde(rename = "photoelectric-1-3")]
    PhotoelectricDistance,
    #[serde(rename = "single-slit")]
    SingleSlit,
    #[serde(rename = "newtons-rings")]
    NewtonsRings,
    #[serde(rename = "pohls-damped")]
    PohlsDamped,
    #[serde(rename = "pohls-forced")]
    PohlsForced,
    #[serde(rename = "polarization")]
    Polarization,
    #[serde(rename = "waves-rope")]
    WavesRope,
    #[serde(rename = "waves-sound")]
    WavesSound,
}

/// Row layout a mode expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// Exactly `[x, y]`.
    Pair,
    /// `[x, series_1, series_2, ...]`, width >= 2 and uniform.
    MultiSeries,
    /// `[group, x, y]`.
    Grouped,
}

impl RowShape {
    pub fn describe(self) -> &'static str {
        match self {
            RowShape::Pair => "2 columns",
            RowShape::MultiSeries => ">= 2 uniform columns",
            RowShape::Grouped => "3 columns (group, x, y)",
        }
    }
}

impl Mode {
    pub const ALL: [Mode; 12] = [
        Mode::StraightLine,
        Mode::Cmc,
        Mode::PhotoelectricWavelength,
        Mode::PhotoelectricPlanck,
        Mode::PhotoelectricDistance,
        Mode::SingleSlit,
        Mode::NewtonsRings,
        Mode::PohlsDamped,
        Mode::PohlsForced,
        Mode::Polarization,
        Mode::WavesRope,
        Mode::WavesSound,
    ];

    /// Wire identifier of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::StraightLine => "straight-line",
            Mode::Cmc => "cmc",
            Mode::PhotoelectricWavelength => "photoelectric-1-1",
            Mode::PhotoelectricPlanck => "photoelectric-1-2",
            Mode::PhotoelectricDistance => "photoelectric-1-3",
            Mode::SingleSlit => "single-slit",
            Mode::NewtonsRings => "newtons-rings",
            Mode::PohlsDamped => "pohls-damped",
            Mode::PohlsForced => "pohls-forced",
            Mode::Polarization => "polarization",
            Mode::WavesRope => "waves-rope",
            Mode::WavesSound => "waves-sound",
        }
    }

    /// Human-readable title for reports and plots.
    pub fn display_name(self) -> &'static str {
        match self {
            Mode::StraightLine => "Straight Line Fit",
            Mode::Cmc => "CMC Determination",
            Mode::PhotoelectricWavelength => "Photoelectric Effect: V-I (wavelength)",
            Mode::PhotoelectricPlanck => "Photoelectric Effect: Planck's Constant",
            Mode::PhotoelectricDistance => "Photoelectric Effect: V-I (distance)",
            Mode::SingleSlit => "Single-Slit Diffraction",
            Mode::NewtonsRings => "Newton's Rings",
            Mode::PohlsDamped => "Pohl's Pendulum: Damped Oscillation",
            Mode::PohlsForced => "Pohl's Pendulum: Forced Oscillation",
            Mode::Polarization => "Polarization (Optical Rotation)",
            Mode::WavesRope => "Standing Waves on a Rope",
            Mode::WavesSound => "Sound Waves in a Closed Pipe",
        }
    }

    pub fn shape(self) -> RowShape {
        match self {
            Mode::PhotoelectricWavelength
            | Mode::PhotoelectricDistance
            | Mode::PohlsDamped
            | Mode::PohlsForced => RowShape::MultiSeries,
            Mode::WavesRope => RowShape::Grouped,
            _ => RowShape::Pair,
        }
    }

    pub fn is_multi_series(self) -> bool {
        self.shape() == RowShape::MultiSeries
    }

    /// Minimum number of rows accepted before any estimator runs.
    pub fn min_rows(self) -> usize {
        match self {
            Mode::Cmc => 4,
            _ => 2,
        }
    }

    /// Default label for the 1-based series index `i` when no header is supplied.
    pub fn default_series_label(self, i: usize) -> String {
        match self {
            Mode::PohlsDamped | Mode::PohlsForced => format!("I_d = {i}"),
            _ => format!("Series {i}"),
        }
    }

    /// Column description handed to the transcription service.
    pub fn column_hint(self) -> &'static str {
        match self {
            Mode::StraightLine => {
                "The table likely has two numeric columns representing X and Y values. "
            }
            Mode::Cmc => {
                "The table likely has columns for concentration (e.g. mol/L or mM) \
                 and surface tension (e.g. mN/m or dyne/cm). "
            }
            Mode::PhotoelectricWavelength => {
                "The table has V_bias (voltage) in the first column and photocurrent I \
                 for different wavelengths in subsequent columns. Column headers may \
                 include wavelength labels like λ=365nm, λ=405nm, etc. "
            }
            Mode::PhotoelectricPlanck => {
                "The table has two columns: frequency (ν, in Hz or THz) \
                 and stopping potential or stopping voltage (V_stop, in Volts). "
            }
            Mode::PhotoelectricDistance => {
                "The table has V_bias (voltage) in the first column and photocurrent I \
                 for different lamp-phototube separations in subsequent columns. \
                 Column headers may include distance labels like d=10cm, d=15cm, etc. "
            }
            Mode::SingleSlit => {
                "The table has two columns: angle θ (theta, in degrees or radians) \
                 and intensity I (arbitrary units or measured units). \
                 θ may be negative for positions on one side of the central maximum. "
            }
            Mode::NewtonsRings => {
                "The table has two columns: ring number n (integer) and \
                 diameter D_n of the ring (in cm or mm). \
                 D_n may also be labeled as 'diameter' or 'D'. "
            }
            Mode::PohlsDamped => {
                "The table has time t in the first column and oscillation amplitude φ \
                 (phi) for different damping currents in subsequent columns. \
                 Column headers may include damping current labels like I_d=0.2A, etc. "
            }
            Mode::PohlsForced => {
                "The table has forcing frequency (in Hz or rad/s) in the first column \
                 and oscillation amplitude for different damping values in subsequent \
                 columns. Column headers may include damping labels. "
            }
            Mode::Polarization => {
                "The table has two columns: concentration c (e.g. g/mL or mol/L) \
                 and rotation angle θ (theta, in degrees). "
            }
            Mode::WavesRope => {
                "The table has three columns: a group or rope identifier, \
                 frequency ν (nu, in Hz) and wavelength λ (lambda, in m). "
            }
            Mode::WavesSound => {
                "The table has two columns: frequency ν (nu, in Hz) and \
                 resonance tube length L (in cm). "
            }
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(mode) = Mode::ALL.into_iter().find(|m| m.as_str() == s) {
            return Ok(mode);
        }
        if s == "waves" {
            return Err(FitError::UnknownMode {
                mode: s.to_string(),
                hint: Some("the combined waves mode is deprecated; use waves-rope or waves-sound"),
            });
        }
        Err(FitError::unknown_mode(s))
    }
}
