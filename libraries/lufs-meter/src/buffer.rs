//! Multichannel sample buffer
//!
//! Samples are stored planar (one `Vec<f64>` per channel) because every
//! stage of the meter works on one channel at a time. Constructors accept
//! interleaved data in the formats decoders usually hand out.

use crate::error::{LoudnessError, Result};
use crate::MAX_CHANNELS;

/// Full-scale divisor for 16-bit PCM
const I16_FULL_SCALE: f64 = 32767.0;

/// Full-scale divisor for 32-bit PCM
const I32_FULL_SCALE: f64 = 2_147_483_647.0;

/// Decoded audio, shape (frames x channels)
///
/// Channel order follows ITU-R BS.1770: Left, Right, Centre, Left surround,
/// Right surround. A mono signal is a buffer with one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f64>>,
}

impl AudioBuffer {
    /// Create a buffer from planar channel data
    ///
    /// # Errors
    /// Returns error if there are no channels, more than five, channels of
    /// unequal length, or any non-finite sample.
    pub fn from_channels(channels: Vec<Vec<f64>>) -> Result<Self> {
        if channels.is_empty() || channels.len() > MAX_CHANNELS {
            return Err(LoudnessError::UnsupportedChannelCount(channels.len()));
        }

        let frames = channels[0].len();
        if channels.iter().any(|ch| ch.len() != frames) {
            return Err(LoudnessError::InvalidBufferLayout {
                samples: channels.iter().map(Vec::len).sum(),
                channels: channels.len(),
            });
        }

        for (channel, data) in channels.iter().enumerate() {
            if let Some(index) = data.iter().position(|s| !s.is_finite()) {
                return Err(LoudnessError::NonFiniteSample { channel, index });
            }
        }

        Ok(Self { channels })
    }

    /// Create a single-channel buffer
    pub fn mono(samples: Vec<f64>) -> Result<Self> {
        Self::from_channels(vec![samples])
    }

    /// Create a buffer from interleaved f64 samples (L R L R ... for stereo)
    pub fn from_interleaved(samples: &[f64], channels: usize) -> Result<Self> {
        Self::deinterleave(samples, channels, |s| s)
    }

    /// Create a buffer from interleaved f32 samples in [-1.0, 1.0]
    pub fn from_interleaved_f32(samples: &[f32], channels: usize) -> Result<Self> {
        Self::deinterleave(samples, channels, f64::from)
    }

    /// Create a buffer from interleaved 16-bit PCM, scaled to [-1.0, 1.0]
    pub fn from_interleaved_i16(samples: &[i16], channels: usize) -> Result<Self> {
        Self::deinterleave(samples, channels, |s| f64::from(s) / I16_FULL_SCALE)
    }

    /// Create a buffer from interleaved 32-bit PCM, scaled to [-1.0, 1.0]
    pub fn from_interleaved_i32(samples: &[i32], channels: usize) -> Result<Self> {
        Self::deinterleave(samples, channels, |s| f64::from(s) / I32_FULL_SCALE)
    }

    fn deinterleave<T: Copy>(
        samples: &[T],
        channels: usize,
        convert: impl Fn(T) -> f64,
    ) -> Result<Self> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(LoudnessError::UnsupportedChannelCount(channels));
        }
        if samples.len() % channels != 0 {
            return Err(LoudnessError::InvalidBufferLayout {
                samples: samples.len(),
                channels,
            });
        }

        let frames = samples.len() / channels;
        let mut planar = vec![Vec::with_capacity(frames); channels];
        for frame in samples.chunks_exact(channels) {
            for (ch, &sample) in planar.iter_mut().zip(frame) {
                ch.push(convert(sample));
            }
        }

        Self::from_channels(planar)
    }

    /// Number of channels
    pub fn channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Whether the buffer holds no frames
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Duration in seconds at the given sample rate
    pub fn duration_secs(&self, sample_rate: u32) -> f64 {
        self.frames() as f64 / f64::from(sample_rate)
    }

    /// Samples of one channel
    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Iterate over the channels
    pub fn iter_channels(&self) -> impl Iterator<Item = &[f64]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Largest absolute sample value across all channels
    pub fn peak(&self) -> f64 {
        self.channels
            .iter()
            .flatten()
            .fold(0.0_f64, |peak, s| peak.max(s.abs()))
    }

    /// Return a copy with every sample multiplied by `gain`
    pub fn scaled(&self, gain: f64) -> Self {
        Self {
            channels: self
                .channels
                .iter()
                .map(|ch| ch.iter().map(|s| s * gain).collect())
                .collect(),
        }
    }

    /// Interleave the channels back into a single vector
    pub fn to_interleaved(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.frames() * self.channels());
        for frame in 0..self.frames() {
            out.extend(self.channels.iter().map(|ch| ch[frame]));
        }
        out
    }

    /// Consume the buffer, returning planar channel data
    pub fn into_channels(self) -> Vec<Vec<f64>> {
        self.channels
    }

    /// Build from already-validated planar data of an existing buffer
    pub(crate) fn from_validated(channels: Vec<Vec<f64>>) -> Self {
        Self { channels }
    }
}
