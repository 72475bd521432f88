//! Error types for loudness measurement

use thiserror::Error;

/// Result type for loudness operations
pub type Result<T> = std::result::Result<T, LoudnessError>;

/// Errors that can occur while designing filters or measuring loudness
///
/// Every variant is derived from the caller's input, so the same input
/// always reproduces the same error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoudnessError {
    /// A filter or meter parameter is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Sample rate is not a positive, finite number
    #[error("Invalid sample rate: {0} Hz (must be positive)")]
    InvalidSampleRate(f64),

    /// Unknown filter class name
    #[error("Invalid filter class: {0}")]
    InvalidFilterClass(String),

    /// Unknown filter type tag
    #[error("Invalid filter type: {0}")]
    InvalidFilterType(String),

    /// Channel count outside 1-5
    #[error("Unsupported channel count: {0} (must be 1-5)")]
    UnsupportedChannelCount(usize),

    /// Sample data does not form whole frames
    #[error("Sample count {samples} does not form whole frames of {channels} channels")]
    InvalidBufferLayout {
        /// Number of samples supplied
        samples: usize,
        /// Number of channels requested
        channels: usize,
    },

    /// NaN or infinite sample in the input
    #[error("Non-finite sample at channel {channel}, index {index}")]
    NonFiniteSample {
        /// Channel of the offending sample
        channel: usize,
        /// Frame index of the offending sample
        index: usize,
    },

    /// Buffer is shorter than one analysis block
    #[error("Audio is {duration_secs:.3} s long, shorter than one {block_secs:.3} s analysis block")]
    InsufficientAudioLength {
        /// Duration of the supplied buffer
        duration_secs: f64,
        /// Duration of one analysis block
        block_secs: f64,
    },

    /// No block survived the absolute and relative gates
    #[error("No gating block survived the loudness gates (silent or too quiet)")]
    DegenerateGating,

    /// Logarithm requested for an energy that has no loudness value
    #[error("Cannot convert energy {0} to loudness")]
    NumericDegenerate(f64),

    /// Not enough gated short-term blocks to compute loudness range
    #[error("Loudness range needs at least {required} gated short-term blocks, found {found}")]
    InsufficientShortTermBlocks {
        /// Blocks that survived gating
        found: usize,
        /// Minimum required
        required: usize,
    },

    /// Audio is completely silent
    #[error("Audio is silent (no peak to normalize)")]
    SilentAudio,
}
