//! Serializable meter configuration
//!
//! Every field has a default, so a partial document (or `{}`) describes a
//! standard BS.1770 meter at 48 kHz.

use crate::error::Result;
use crate::filter::{make_filter, FilterClass, FilterStage, FilterType};
use crate::range::{self, RangeSettings};
use crate::{DEFAULT_BLOCK_SECS, DEFAULT_OVERLAP};
use serde::{Deserialize, Serialize};

/// Meter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Gating block duration in seconds
    pub block_size: f64,
    /// Overlap between gating blocks, in [0, 1)
    pub overlap: f64,
    /// Filter class name, e.g. `"K-weighting"` or `"custom"`
    pub filter_class: String,
    /// Stages of a `"custom"` class, in order
    pub stages: Vec<StageConfig>,
    /// Per-channel power weights; missing entries keep the BS.1770 values
    pub channel_weights: Option<Vec<f64>>,
    /// Loudness range parameters
    pub range: RangeConfig,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: DEFAULT_BLOCK_SECS,
            overlap: DEFAULT_OVERLAP,
            filter_class: FilterClass::KWeighting.name().to_string(),
            stages: Vec::new(),
            channel_weights: None,
            range: RangeConfig::default(),
        }
    }
}

impl MeterConfig {
    /// Resolve the filter class, designing custom stages at `sample_rate`
    ///
    /// # Errors
    /// Returns error for an unknown class or stage type, or a stage that
    /// cannot be designed at this rate.
    pub fn filter_class(&self) -> Result<FilterClass> {
        match self.filter_class.parse::<FilterClass>()? {
            FilterClass::Custom(_) => {
                let stages = self
                    .stages
                    .iter()
                    .map(|stage| stage.design(f64::from(self.sample_rate)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(FilterClass::Custom(stages))
            }
            named => Ok(named),
        }
    }
}

/// One stage of a custom cascade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Stage type tag, e.g. `"high_shelf"`
    pub filter_type: String,
    #[serde(default)]
    pub gain_db: f64,
    pub q: f64,
    pub center_hz: f64,
    #[serde(default = "unity")]
    pub passband_gain: f64,
}

fn unity() -> f64 {
    1.0
}

impl StageConfig {
    /// Design this stage at `sample_rate`
    ///
    /// # Errors
    /// Returns `InvalidFilterType` for an unknown tag, and the
    /// [`make_filter`] errors for parameters that cannot be designed at this
    /// rate or a non-finite passband gain.
    pub fn design(&self, sample_rate: f64) -> Result<FilterStage> {
        let filter_type: FilterType = self.filter_type.parse()?;
        make_filter(self.gain_db, self.q, self.center_hz, sample_rate, filter_type)?
            .with_passband_gain(self.passband_gain)
    }
}

/// Loudness range parameters (EBU Tech 3342 defaults)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    pub block_size: f64,
    pub overlap: f64,
    pub relative_gate_lu: f64,
    pub lower_percentile: f64,
    pub upper_percentile: f64,
    pub min_blocks: usize,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            block_size: range::SHORT_TERM_BLOCK_SECS,
            overlap: range::SHORT_TERM_OVERLAP,
            relative_gate_lu: range::RANGE_RELATIVE_GATE_LU,
            lower_percentile: range::LOWER_PERCENTILE,
            upper_percentile: range::UPPER_PERCENTILE,
            min_blocks: range::MIN_RANGE_BLOCKS,
        }
    }
}

impl From<RangeConfig> for RangeSettings {
    fn from(c: RangeConfig) -> Self {
        Self {
            block_secs: c.block_size,
            overlap: c.overlap,
            relative_gate_lu: c.relative_gate_lu,
            lower_percentile: c.lower_percentile,
            upper_percentile: c.upper_percentile,
            min_blocks: c.min_blocks,
        }
    }
}
