//! Peak and loudness normalization
//!
//! Plain linear gain. The helpers never clip or limit; they only warn when
//! the result reaches full scale, and leave the policy to the caller.

use crate::buffer::AudioBuffer;
use crate::error::{LoudnessError, Result};
use crate::{EBU_R128_BROADCAST_LUFS, REPLAYGAIN_REFERENCE_LUFS, STREAMING_LUFS};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Loudness level to normalize towards
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LoudnessTarget {
    /// EBU R128 broadcast level (-23 LUFS)
    #[default]
    EbuR128Broadcast,
    /// Common streaming platform level (-14 LUFS)
    Streaming,
    /// ReplayGain 2.0 reference level (-18 LUFS)
    ReplayGain,
    /// Any other level in LUFS
    Custom(f64),
}

impl LoudnessTarget {
    /// Target level in LUFS
    pub fn lufs(&self) -> f64 {
        match self {
            Self::EbuR128Broadcast => EBU_R128_BROADCAST_LUFS,
            Self::Streaming => STREAMING_LUFS,
            Self::ReplayGain => REPLAYGAIN_REFERENCE_LUFS,
            Self::Custom(lufs) => *lufs,
        }
    }

    /// Gain in dB that brings `current_lufs` to this target
    pub fn gain_db(&self, current_lufs: f64) -> f64 {
        self.lufs() - current_lufs
    }
}

impl FromStr for LoudnessTarget {
    type Err = LoudnessError;

    /// Parse a preset name or a bare LUFS value such as `"-16"`
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ebu_r128" | "ebur128" | "broadcast" => Ok(Self::EbuR128Broadcast),
            "streaming" => Ok(Self::Streaming),
            "replaygain" | "rg" => Ok(Self::ReplayGain),
            other => other
                .trim_end_matches("lufs")
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Self::Custom)
                .ok_or_else(|| {
                    LoudnessError::InvalidParameter(format!("unknown loudness target: {s}"))
                }),
        }
    }
}

impl fmt::Display for LoudnessTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} LUFS", self.lufs())
    }
}

/// Linear gain for a change of `gain_db`
pub fn db_to_gain(gain_db: f64) -> f64 {
    10.0_f64.powf(gain_db / 20.0)
}

/// Scale `buffer` so its largest sample reaches `target_db` dBFS
///
/// # Errors
/// Returns `SilentAudio` for an all-zero buffer and `InvalidParameter`
/// for a non-finite target.
pub fn peak(buffer: &AudioBuffer, target_db: f64) -> Result<AudioBuffer> {
    if !target_db.is_finite() {
        return Err(LoudnessError::InvalidParameter(format!(
            "peak target must be finite, got {target_db} dB"
        )));
    }
    let current = buffer.peak();
    if current == 0.0 {
        return Err(LoudnessError::SilentAudio);
    }

    Ok(apply_gain(buffer, db_to_gain(target_db) / current))
}

/// Scale `buffer` from `input_lufs` to `target_lufs`
///
/// # Errors
/// Returns `InvalidParameter` when either level is not finite.
pub fn loudness(buffer: &AudioBuffer, input_lufs: f64, target_lufs: f64) -> Result<AudioBuffer> {
    if !(input_lufs.is_finite() && target_lufs.is_finite()) {
        return Err(LoudnessError::InvalidParameter(format!(
            "loudness levels must be finite, got {input_lufs} -> {target_lufs} LUFS"
        )));
    }

    Ok(apply_gain(buffer, db_to_gain(target_lufs - input_lufs)))
}

fn apply_gain(buffer: &AudioBuffer, gain: f64) -> AudioBuffer {
    let output = buffer.scaled(gain);
    let output_peak = output.peak();
    if output_peak >= 1.0 {
        warn!(
            peak = output_peak,
            gain, "possible clipped samples in normalized output"
        );
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_normalize() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.25, -0.1], vec![0.05, 0.2]]).unwrap();
        let out = peak(&buffer, -6.0).unwrap();
        assert!((out.peak() - db_to_gain(-6.0)).abs() < 1e-12);
        // Relative levels are preserved
        let ratio = out.channel(1).unwrap()[1] / out.channel(0).unwrap()[0];
        assert!((ratio - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_peak_normalize_silence() {
        let buffer = AudioBuffer::mono(vec![0.0; 16]).unwrap();
        assert_eq!(peak(&buffer, -1.0), Err(LoudnessError::SilentAudio));
    }

    #[test]
    fn test_loudness_normalize_gain() {
        let buffer = AudioBuffer::mono(vec![0.1, -0.1]).unwrap();
        let out = loudness(&buffer, -20.0, -14.0).unwrap();
        // +6 dB is roughly doubling
        assert!((out.channel(0).unwrap()[0] - 0.1 * db_to_gain(6.0)).abs() < 1e-12);
        assert!(loudness(&buffer, f64::NEG_INFINITY, -14.0).is_err());
    }

    #[test]
    fn test_target_presets() {
        assert_eq!(LoudnessTarget::default().lufs(), -23.0);
        assert_eq!(LoudnessTarget::Streaming.lufs(), -14.0);
        assert_eq!(LoudnessTarget::ReplayGain.lufs(), -18.0);
        assert!((LoudnessTarget::Streaming.gain_db(-20.0) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_target_parsing() {
        assert_eq!(
            "broadcast".parse::<LoudnessTarget>().unwrap(),
            LoudnessTarget::EbuR128Broadcast
        );
        assert_eq!(
            "STREAMING".parse::<LoudnessTarget>().unwrap(),
            LoudnessTarget::Streaming
        );
        assert_eq!(
            "-16 LUFS".parse::<LoudnessTarget>().unwrap(),
            LoudnessTarget::Custom(-16.0)
        );
        assert_eq!(
            "-24".parse::<LoudnessTarget>().unwrap(),
            LoudnessTarget::Custom(-24.0)
        );
        assert!("loud".parse::<LoudnessTarget>().is_err());
        assert!("nan".parse::<LoudnessTarget>().is_err());
    }
}
