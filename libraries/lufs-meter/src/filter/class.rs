//! Named weighting-filter classes

use super::design::{make_filter, FilterStage, FilterType};
use crate::error::{LoudnessError, Result};
use std::fmt;
use std::str::FromStr;

const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// A named, ordered list of weighting stages
///
/// Named classes design their stages for a given sample rate through
/// [`FilterClass::stages`]. `Custom` carries stages that were already
/// designed by the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FilterClass {
    /// ITU-R BS.1770 K-weighting (high shelf, then high-pass)
    #[default]
    KWeighting,
    /// Bilinear-transform K-weighting matching the published 48 kHz table
    DeMan,
    /// Fenton/Lee variant with a 130 Hz high-pass and a 5 dB shelf
    FentonLee1,
    /// Fenton/Lee variant using the K-weighting parameters
    FentonLee2,
    /// Dash et al. high-pass with a 1 kHz peaking cut
    DashEtAl,
    /// Caller-designed stages, applied in order
    Custom(Vec<FilterStage>),
}

/// (type, gain dB, Q, centre Hz)
type StageSpec = (FilterType, f64, f64, f64);

impl FilterClass {
    /// Canonical display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::KWeighting => "K-weighting",
            Self::DeMan => "DeMan",
            Self::FentonLee1 => "Fenton/Lee 1",
            Self::FentonLee2 => "Fenton/Lee 2",
            Self::DashEtAl => "Dash et al.",
            Self::Custom(_) => "custom",
        }
    }

    fn stage_specs(&self) -> &'static [StageSpec] {
        match self {
            Self::KWeighting | Self::FentonLee2 => &[
                (FilterType::HighShelf, 4.0, BUTTERWORTH_Q, 1500.0),
                (FilterType::HighPass, 0.0, 0.5, 38.0),
            ],
            Self::FentonLee1 => &[
                (FilterType::HighShelf, 5.0, BUTTERWORTH_Q, 1500.0),
                (FilterType::HighPass, 0.0, 0.5, 130.0),
                (FilterType::Peaking, 0.0, BUTTERWORTH_Q, 500.0),
            ],
            Self::DashEtAl => &[
                (FilterType::HighPass, 0.0, 0.375, 149.0),
                (FilterType::Peaking, -2.938_209_27, 1.688_786_55, 1000.0),
            ],
            Self::DeMan => &[
                (
                    FilterType::HighShelfDeMan,
                    3.999_843_853_97,
                    0.707_175_236_955_419_3,
                    1_681.974_450_955_531_9,
                ),
                (
                    FilterType::HighPassDeMan,
                    0.0,
                    0.500_327_037_325_395_3,
                    38.135_470_876_139_82,
                ),
            ],
            Self::Custom(_) => &[],
        }
    }

    /// Design this class's stages for `sample_rate`
    ///
    /// For `Custom` the caller's stages are returned as-is; they must
    /// already have been designed for `sample_rate`.
    ///
    /// # Errors
    /// Returns error if a stage cannot be designed at this rate (for example
    /// a corner frequency at or above Nyquist) or a custom stage was designed
    /// for a different rate.
    pub fn stages(&self, sample_rate: f64) -> Result<Vec<FilterStage>> {
        if let Self::Custom(stages) = self {
            if let Some(stage) = stages.iter().find(|s| s.sample_rate() != sample_rate) {
                return Err(LoudnessError::InvalidParameter(format!(
                    "custom {} stage was designed for {} Hz, meter runs at {} Hz",
                    stage.filter_type(),
                    stage.sample_rate(),
                    sample_rate
                )));
            }
            return Ok(stages.clone());
        }

        self.stage_specs()
            .iter()
            .map(|&(filter_type, gain_db, q, center_hz)| {
                make_filter(gain_db, q, center_hz, sample_rate, filter_type)
            })
            .collect()
    }
}

impl FromStr for FilterClass {
    type Err = LoudnessError;

    /// Parse a class name; `custom` yields an empty custom cascade
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "K-weighting" | "k_weighting" => Ok(Self::KWeighting),
            "DeMan" | "deman" => Ok(Self::DeMan),
            "Fenton/Lee 1" | "fenton_lee_1" => Ok(Self::FentonLee1),
            "Fenton/Lee 2" | "fenton_lee_2" => Ok(Self::FentonLee2),
            "Dash et al." | "dash_et_al" => Ok(Self::DashEtAl),
            "custom" => Ok(Self::Custom(Vec::new())),
            _ => Err(LoudnessError::InvalidFilterClass(s.to_string())),
        }
    }
}

impl fmt::Display for FilterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
