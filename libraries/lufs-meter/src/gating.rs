//! Two-stage gating and integration (ITU-R BS.1770-4, section 2.8)
//!
//! The relative threshold is derived from the blocks that pass the
//! absolute threshold, so integration runs as two explicit passes:
//!
//! 1. keep blocks at or above -70 LKFS;
//! 2. compute the loudness of their mean power, subtract 10 LU, and keep
//!    the absolutely gated blocks at or above that level.
//!
//! The integrated loudness is the loudness of the mean power of the blocks
//! that survive both passes. Only set membership matters; block order
//! never affects the result.

use crate::blocks::Block;
use crate::channel::ChannelWeights;
use crate::error::{LoudnessError, Result};
use tracing::debug;

/// Calibration term of the BS.1770 loudness formula, in dB
pub const LOUDNESS_OFFSET_DB: f64 = -0.691;

/// Absolute gating threshold in LKFS
pub const ABSOLUTE_GATE_LUFS: f64 = -70.0;

/// Relative gate for integrated loudness, in LU below the gated mean
pub const RELATIVE_GATE_LU: f64 = -10.0;

/// Convert a (channel-weighted) mean-square energy to LKFS
///
/// # Errors
/// Returns `NumericDegenerate` for zero, negative or non-finite energy,
/// which has no logarithm.
pub fn energy_to_lufs(energy: f64) -> Result<f64> {
    if energy > 0.0 && energy.is_finite() {
        Ok(LOUDNESS_OFFSET_DB + 10.0 * energy.log10())
    } else {
        Err(LoudnessError::NumericDegenerate(energy))
    }
}

/// Inverse of [`energy_to_lufs`]
pub fn lufs_to_energy(lufs: f64) -> f64 {
    10.0_f64.powf((lufs - LOUDNESS_OFFSET_DB) / 10.0)
}

/// Channel-weighted energy of a block and its loudness
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockLoudness {
    /// Weighted sum of channel mean squares
    pub energy: f64,
    /// Loudness in LKFS, `None` for a zero-energy block
    ///
    /// Overflowed (non-finite) energies also carry `None` here and are
    /// rejected by [`ensure_finite`] before any gating.
    pub lufs: Option<f64>,
}

impl BlockLoudness {
    pub fn from_energy(energy: f64) -> Self {
        Self {
            energy,
            lufs: energy_to_lufs(energy).ok(),
        }
    }

    /// Whether the block reaches `threshold_lufs`; silent blocks never do
    pub fn passes(&self, threshold_lufs: f64) -> bool {
        self.lufs.is_some_and(|l| l >= threshold_lufs)
    }
}

/// Outcome of integrating one buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatingReport {
    /// Gated integrated loudness in LUFS
    pub integrated_lufs: f64,
    /// Relative threshold used by the second pass, in LUFS
    pub relative_threshold_lufs: f64,
    /// Blocks measured
    pub total_blocks: usize,
    /// Blocks at or above the absolute threshold
    pub above_absolute: usize,
    /// Blocks that passed both thresholds
    pub above_relative: usize,
}

/// Reject blocks whose energy overflowed
///
/// Zero energy is valid (silence). A non-finite energy means the squared
/// samples exceeded the f64 range and no loudness can be reported.
///
/// # Errors
/// Returns `NumericDegenerate` with the first non-finite energy
pub fn ensure_finite(blocks: &[BlockLoudness]) -> Result<()> {
    match blocks.iter().find(|b| !b.energy.is_finite()) {
        Some(block) => Err(LoudnessError::NumericDegenerate(block.energy)),
        None => Ok(()),
    }
}

/// Weight and convert every block
pub fn block_loudness<I>(blocks: I, weights: &ChannelWeights) -> Vec<BlockLoudness>
where
    I: IntoIterator<Item = Block>,
{
    blocks
        .into_iter()
        .map(|block| BlockLoudness::from_energy(weights.weighted_sum(&block.mean_square)))
        .collect()
}

/// Blocks at or above the -70 LKFS absolute threshold
pub fn absolute_gate(blocks: &[BlockLoudness]) -> Vec<BlockLoudness> {
    blocks
        .iter()
        .copied()
        .filter(|b| b.passes(ABSOLUTE_GATE_LUFS))
        .collect()
}

/// Loudness of the mean power of `blocks`
///
/// # Errors
/// Returns `DegenerateGating` for an empty set
pub fn mean_loudness(blocks: &[BlockLoudness]) -> Result<f64> {
    if blocks.is_empty() {
        return Err(LoudnessError::DegenerateGating);
    }
    let mean = blocks.iter().map(|b| b.energy).sum::<f64>() / blocks.len() as f64;
    energy_to_lufs(mean)
}

/// Relative threshold `offset_lu` below the mean of `gated`
pub fn relative_threshold(gated: &[BlockLoudness], offset_lu: f64) -> Result<f64> {
    Ok(mean_loudness(gated)? + offset_lu)
}

/// Gated integrated loudness of a block sequence
///
/// # Errors
/// - `NumericDegenerate` if a block energy overflowed
/// - `DegenerateGating` when no block survives either pass (silence or
///   content entirely below -70 LKFS)
pub fn integrate(blocks: &[BlockLoudness]) -> Result<GatingReport> {
    ensure_finite(blocks)?;
    let above_absolute = absolute_gate(blocks);
    let relative_threshold_lufs = relative_threshold(&above_absolute, RELATIVE_GATE_LU)?;

    let above_relative: Vec<BlockLoudness> = above_absolute
        .iter()
        .copied()
        .filter(|b| b.passes(relative_threshold_lufs))
        .collect();
    let integrated_lufs = mean_loudness(&above_relative)?;

    debug!(
        total = blocks.len(),
        above_absolute = above_absolute.len(),
        above_relative = above_relative.len(),
        relative_threshold_lufs,
        integrated_lufs,
        "gating complete"
    );

    Ok(GatingReport {
        integrated_lufs,
        relative_threshold_lufs,
        total_blocks: blocks.len(),
        above_absolute: above_absolute.len(),
        above_relative: above_relative.len(),
    })
}
