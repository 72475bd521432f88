//! Channel weighting for the multichannel power sum

use crate::error::{LoudnessError, Result};
use crate::MAX_CHANNELS;

/// Power weights applied when summing channel energies
///
/// Indexed in BS.1770 channel order (L, R, C, Ls, Rs). Surround channels
/// carry 1.41 (about +1.5 dB).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelWeights([f64; MAX_CHANNELS]);

impl ChannelWeights {
    /// BS.1770 weights
    pub const STANDARD: Self = Self([1.0, 1.0, 1.0, 1.41, 1.41]);

    /// Custom weights for up to five channels
    ///
    /// Channels beyond `weights.len()` keep their standard weight.
    ///
    /// # Errors
    /// Returns error for more than five weights or any negative or
    /// non-finite weight.
    pub fn new(weights: &[f64]) -> Result<Self> {
        if weights.len() > MAX_CHANNELS {
            return Err(LoudnessError::UnsupportedChannelCount(weights.len()));
        }
        if let Some(w) = weights.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
            return Err(LoudnessError::InvalidParameter(format!(
                "channel weight must be finite and non-negative, got {w}"
            )));
        }

        let mut table = Self::STANDARD.0;
        table[..weights.len()].copy_from_slice(weights);
        Ok(Self(table))
    }

    /// Weight of one channel
    ///
    /// # Errors
    /// Returns error for a channel index outside the table
    pub fn weight(&self, channel: usize) -> Result<f64> {
        self.0
            .get(channel)
            .copied()
            .ok_or(LoudnessError::UnsupportedChannelCount(channel + 1))
    }

    /// Weighted sum of per-channel mean-square energies
    ///
    /// `energies` never exceeds five entries; buffers are validated on
    /// construction.
    pub fn weighted_sum(&self, energies: &[f64]) -> f64 {
        energies.iter().zip(self.0.iter()).map(|(z, g)| g * z).sum()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Default for ChannelWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}
