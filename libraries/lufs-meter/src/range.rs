//! Loudness range (EBU Tech 3342)
//!
//! Short-term loudness is measured over 3 s windows. The windows are gated
//! at -70 LKFS and then at 20 LU below the mean power of the absolutely
//! gated set. LRA is the spread between the 10th and 95th percentiles of
//! the surviving loudness values.

use crate::error::{LoudnessError, Result};
use crate::gating::{absolute_gate, ensure_finite, relative_threshold, BlockLoudness};
use tracing::debug;

/// Short-term window duration in seconds
pub const SHORT_TERM_BLOCK_SECS: f64 = 3.0;

/// Overlap between consecutive short-term windows
pub const SHORT_TERM_OVERLAP: f64 = 2.0 / 3.0;

/// Relative gate for loudness range, in LU below the gated mean
pub const RANGE_RELATIVE_GATE_LU: f64 = -20.0;

/// Lower percentile of the range statistic
pub const LOWER_PERCENTILE: f64 = 10.0;

/// Upper percentile of the range statistic
pub const UPPER_PERCENTILE: f64 = 95.0;

/// Fewest gated short-term blocks for a meaningful range
pub const MIN_RANGE_BLOCKS: usize = 2;

/// Parameters of the range statistic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSettings {
    pub block_secs: f64,
    pub overlap: f64,
    pub relative_gate_lu: f64,
    pub lower_percentile: f64,
    pub upper_percentile: f64,
    pub min_blocks: usize,
}

impl Default for RangeSettings {
    fn default() -> Self {
        Self {
            block_secs: SHORT_TERM_BLOCK_SECS,
            overlap: SHORT_TERM_OVERLAP,
            relative_gate_lu: RANGE_RELATIVE_GATE_LU,
            lower_percentile: LOWER_PERCENTILE,
            upper_percentile: UPPER_PERCENTILE,
            min_blocks: MIN_RANGE_BLOCKS,
        }
    }
}

impl RangeSettings {
    /// Check the percentile pair and gate offset
    ///
    /// Window duration and overlap are checked when the block layout is
    /// derived.
    pub fn validate(&self) -> Result<()> {
        let valid_pct = |p: f64| (0.0..=100.0).contains(&p);
        if !(valid_pct(self.lower_percentile)
            && valid_pct(self.upper_percentile)
            && self.lower_percentile < self.upper_percentile)
        {
            return Err(LoudnessError::InvalidParameter(format!(
                "percentiles must satisfy 0 <= lower < upper <= 100, got {} and {}",
                self.lower_percentile, self.upper_percentile
            )));
        }
        if !(self.relative_gate_lu.is_finite() && self.relative_gate_lu <= 0.0) {
            return Err(LoudnessError::InvalidParameter(format!(
                "relative gate must be a non-positive offset, got {} LU",
                self.relative_gate_lu
            )));
        }
        if self.min_blocks == 0 {
            return Err(LoudnessError::InvalidParameter(
                "loudness range needs at least one block".to_string(),
            ));
        }
        Ok(())
    }
}

/// Percentile of sorted data, interpolating linearly between ranks
///
/// `sorted` must be ascending.
///
/// # Errors
/// Returns `InvalidParameter` for an empty slice or `pct` outside [0, 100].
pub fn percentile(sorted: &[f64], pct: f64) -> Result<f64> {
    if sorted.is_empty() {
        return Err(LoudnessError::InvalidParameter(
            "percentile of an empty set".to_string(),
        ));
    }
    if !(0.0..=100.0).contains(&pct) {
        return Err(LoudnessError::InvalidParameter(format!(
            "percentile must be in [0, 100], got {pct}"
        )));
    }

    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Loudness range in LU of a short-term block sequence
///
/// # Errors
/// - `InvalidParameter` for settings that fail [`RangeSettings::validate`]
/// - `NumericDegenerate` if a block energy overflowed
/// - `InsufficientShortTermBlocks` when fewer than `settings.min_blocks`
///   blocks survive gating
pub fn loudness_range(blocks: &[BlockLoudness], settings: &RangeSettings) -> Result<f64> {
    settings.validate()?;
    ensure_finite(blocks)?;

    let insufficient = |found| LoudnessError::InsufficientShortTermBlocks {
        found,
        required: settings.min_blocks,
    };

    let above_absolute = absolute_gate(blocks);
    if above_absolute.is_empty() {
        return Err(insufficient(0));
    }
    let threshold = relative_threshold(&above_absolute, settings.relative_gate_lu)?;

    let mut gated: Vec<f64> = above_absolute
        .iter()
        .filter(|b| b.passes(threshold))
        .filter_map(|b| b.lufs)
        .collect();

    debug!(
        total = blocks.len(),
        above_absolute = above_absolute.len(),
        gated = gated.len(),
        relative_threshold_lufs = threshold,
        "loudness range gating complete"
    );

    if gated.len() < settings.min_blocks {
        return Err(insufficient(gated.len()));
    }

    gated.sort_by(f64::total_cmp);
    let low = percentile(&gated, settings.lower_percentile)?;
    let high = percentile(&gated, settings.upper_percentile)?;
    Ok(high - low)
}
