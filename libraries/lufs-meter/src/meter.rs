//! Loudness meter
//!
//! A [`Meter`] is built once per sample rate and owns its weighting cascade.
//! Measurement methods take `&self` and never mutate the meter, so one meter
//! can serve any number of buffers, including from several threads.

use crate::blocks::{blocks, BlockLayout};
use crate::buffer::AudioBuffer;
use crate::channel::ChannelWeights;
use crate::config::MeterConfig;
use crate::error::{LoudnessError, Result};
use crate::filter::{apply_cascade, FilterClass, FilterStage};
use crate::gating::{self, block_loudness, BlockLoudness, GatingReport};
use crate::range::{self, RangeSettings};
use crate::{DEFAULT_BLOCK_SECS, DEFAULT_OVERLAP};
use std::fmt;
use tracing::debug;

/// Summary of a buffer's loudness characteristics
#[derive(Debug, Clone, PartialEq)]
pub struct LoudnessReport {
    /// Gated integrated loudness in LUFS
    pub integrated_lufs: f64,

    /// Loudness range in LU
    /// `None` when the buffer is too short or too quiet for a range
    pub loudness_range_lu: Option<f64>,

    /// Largest absolute sample value in dBFS (not oversampled)
    pub sample_peak_dbfs: f64,

    /// Duration of the analyzed audio in seconds
    pub duration_seconds: f64,

    /// Sample rate of the analyzed audio
    pub sample_rate: u32,

    /// Number of channels
    pub channels: usize,
}

impl LoudnessReport {
    /// Check if the audio would clip when applying gain
    pub fn will_clip_at_gain(&self, gain_db: f64) -> bool {
        self.sample_peak_dbfs + gain_db > 0.0
    }

    /// Largest gain that keeps the sample peak at or below full scale
    pub fn max_safe_gain(&self) -> f64 {
        -self.sample_peak_dbfs
    }
}

impl fmt::Display for LoudnessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Loudness: {:.1} LUFS, Range: ", self.integrated_lufs)?;
        match self.loudness_range_lu {
            Some(lra) => write!(f, "{lra:.1} LU")?,
            None => write!(f, "n/a")?,
        }
        write!(f, ", Sample Peak: {:.1} dBFS", self.sample_peak_dbfs)
    }
}

/// BS.1770 loudness meter
///
/// # Example
///
/// ```ignore
/// use lufs_meter::{AudioBuffer, Meter};
///
/// let meter = Meter::new(48000)?;
/// let buffer = AudioBuffer::from_interleaved_f32(&samples, 2)?;
///
/// let lufs = meter.integrated_loudness(&buffer)?;
/// let lra = meter.loudness_range(&buffer)?;
/// println!("{lufs:.1} LUFS, LRA {lra:.1} LU");
/// ```
#[derive(Debug, Clone)]
pub struct Meter {
    sample_rate: u32,
    block_size: f64,
    overlap: f64,
    filter_class: FilterClass,
    stages: Vec<FilterStage>,
    weights: ChannelWeights,
    gating_layout: BlockLayout,
    range: RangeSettings,
    range_layout: BlockLayout,
}

impl Meter {
    /// Create a K-weighted meter with 400 ms gating blocks
    ///
    /// # Errors
    /// Returns error if the sample rate is zero or too low for the
    /// K-weighting shelf (below 3 kHz).
    pub fn new(sample_rate: u32) -> Result<Self> {
        MeterBuilder::new(sample_rate).build()
    }

    /// Create a meter with a given block size and filter class
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz
    /// * `block_size` - Gating block duration in seconds
    /// * `filter_class` - Weighting cascade to design
    ///
    /// # Errors
    /// Returns error if the sample rate is zero, the block size is not
    /// positive, or the class's stages cannot be designed at this rate.
    pub fn with_filter_class(
        sample_rate: u32,
        block_size: f64,
        filter_class: FilterClass,
    ) -> Result<Self> {
        MeterBuilder::new(sample_rate)
            .block_size(block_size)
            .filter_class(filter_class)
            .build()
    }

    /// Start building a meter
    pub fn builder(sample_rate: u32) -> MeterBuilder {
        MeterBuilder::new(sample_rate)
    }

    /// Build a meter from configuration
    ///
    /// # Errors
    /// Returns `InvalidFilterClass`/`InvalidFilterType` for unknown names,
    /// and the same errors as [`MeterBuilder::build`] otherwise.
    pub fn from_config(config: &MeterConfig) -> Result<Self> {
        let mut builder = MeterBuilder::new(config.sample_rate)
            .block_size(config.block_size)
            .overlap(config.overlap)
            .filter_class(config.filter_class()?)
            .range_settings(config.range.into());
        if let Some(weights) = &config.channel_weights {
            builder = builder.channel_weights(ChannelWeights::new(weights)?);
        }
        builder.build()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Gating block duration in seconds
    pub fn block_size(&self) -> f64 {
        self.block_size
    }

    pub fn overlap(&self) -> f64 {
        self.overlap
    }

    pub fn filter_class(&self) -> &FilterClass {
        &self.filter_class
    }

    /// The weighting cascade, in application order
    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn channel_weights(&self) -> &ChannelWeights {
        &self.weights
    }

    pub fn range_settings(&self) -> &RangeSettings {
        &self.range
    }

    /// Apply the weighting cascade to `buffer`
    pub fn filter(&self, buffer: &AudioBuffer) -> AudioBuffer {
        apply_cascade(&self.stages, buffer)
    }

    /// Gated integrated loudness in LUFS
    ///
    /// # Errors
    /// - `InsufficientAudioLength` if the buffer is shorter than one block
    /// - `DegenerateGating` if no block survives gating (e.g. silence)
    /// - `NumericDegenerate` if samples are so large their energy overflows
    pub fn integrated_loudness(&self, buffer: &AudioBuffer) -> Result<f64> {
        Ok(self.gated_loudness(buffer)?.integrated_lufs)
    }

    /// Integrated loudness together with the gating statistics
    pub fn gated_loudness(&self, buffer: &AudioBuffer) -> Result<GatingReport> {
        self.check_length(buffer, self.gating_layout, self.block_size)?;
        self.integrate_filtered(&self.filter(buffer))
    }

    /// Short-term (3 s) loudness series in LUFS
    ///
    /// Zero-energy windows have no loudness and are reported as `None`.
    ///
    /// # Errors
    /// - `InsufficientAudioLength` if the buffer is shorter than one window
    /// - `NumericDegenerate` if a window's energy overflowed
    pub fn short_term_loudness(&self, buffer: &AudioBuffer) -> Result<Vec<Option<f64>>> {
        self.check_length(buffer, self.range_layout, self.range.block_secs)?;
        let blocks = self.short_term_blocks(&self.filter(buffer));
        gating::ensure_finite(&blocks)?;
        Ok(blocks.into_iter().map(|b| b.lufs).collect())
    }

    /// Loudness range in LU (EBU Tech 3342)
    ///
    /// # Errors
    /// - `InsufficientAudioLength` if the buffer is shorter than one
    ///   short-term window
    /// - `InsufficientShortTermBlocks` if too few windows survive gating
    pub fn loudness_range(&self, buffer: &AudioBuffer) -> Result<f64> {
        self.check_length(buffer, self.range_layout, self.range.block_secs)?;
        self.range_filtered(&self.filter(buffer))
    }

    /// Measure everything at once, filtering the buffer a single time
    ///
    /// Fails only when integrated loudness cannot be measured; an
    /// unavailable loudness range is reported as `None`.
    pub fn analyze(&self, buffer: &AudioBuffer) -> Result<LoudnessReport> {
        self.check_length(buffer, self.gating_layout, self.block_size)?;
        let filtered = self.filter(buffer);

        let integrated_lufs = self.integrate_filtered(&filtered)?.integrated_lufs;

        let loudness_range_lu = if self.range_layout.count(filtered.frames()) == 0 {
            None
        } else {
            match self.range_filtered(&filtered) {
                Ok(lra) => Some(lra),
                Err(LoudnessError::InsufficientShortTermBlocks { .. }) => None,
                Err(e) => return Err(e),
            }
        };

        let peak = buffer.peak();
        let sample_peak_dbfs = if peak > 0.0 {
            20.0 * peak.log10()
        } else {
            -f64::INFINITY
        };

        Ok(LoudnessReport {
            integrated_lufs,
            loudness_range_lu,
            sample_peak_dbfs,
            duration_seconds: buffer.duration_secs(self.sample_rate),
            sample_rate: self.sample_rate,
            channels: buffer.channels(),
        })
    }

    fn check_length(&self, buffer: &AudioBuffer, layout: BlockLayout, block_secs: f64) -> Result<()> {
        if layout.count(buffer.frames()) == 0 {
            return Err(LoudnessError::InsufficientAudioLength {
                duration_secs: buffer.duration_secs(self.sample_rate),
                block_secs,
            });
        }
        Ok(())
    }

    fn integrate_filtered(&self, filtered: &AudioBuffer) -> Result<GatingReport> {
        let loudness = block_loudness(blocks(filtered, self.gating_layout), &self.weights);
        gating::integrate(&loudness)
    }

    fn short_term_blocks(&self, filtered: &AudioBuffer) -> Vec<BlockLoudness> {
        block_loudness(blocks(filtered, self.range_layout), &self.weights)
    }

    fn range_filtered(&self, filtered: &AudioBuffer) -> Result<f64> {
        range::loudness_range(&self.short_term_blocks(filtered), &self.range)
    }
}

/// Builder for [`Meter`]
///
/// Custom weighting stages are added with [`MeterBuilder::with_stage`]; the
/// finished meter never changes its cascade.
#[derive(Debug, Clone)]
pub struct MeterBuilder {
    sample_rate: u32,
    block_size: f64,
    overlap: f64,
    filter_class: FilterClass,
    extra_stages: Vec<FilterStage>,
    weights: ChannelWeights,
    range: RangeSettings,
}

impl MeterBuilder {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            block_size: DEFAULT_BLOCK_SECS,
            overlap: DEFAULT_OVERLAP,
            filter_class: FilterClass::default(),
            extra_stages: Vec::new(),
            weights: ChannelWeights::default(),
            range: RangeSettings::default(),
        }
    }

    /// Gating block duration in seconds (default 0.4)
    pub fn block_size(mut self, block_size: f64) -> Self {
        self.block_size = block_size;
        self
    }

    /// Gating block overlap (default 0.75)
    pub fn overlap(mut self, overlap: f64) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn filter_class(mut self, filter_class: FilterClass) -> Self {
        self.filter_class = filter_class;
        self
    }

    /// Append a stage to a custom cascade
    ///
    /// Only valid together with [`FilterClass::Custom`]; building with
    /// extra stages on a named class fails.
    pub fn with_stage(mut self, stage: FilterStage) -> Self {
        self.extra_stages.push(stage);
        self
    }

    pub fn channel_weights(mut self, weights: ChannelWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn range_settings(mut self, range: RangeSettings) -> Self {
        self.range = range;
        self
    }

    /// Validate the settings and design the cascade
    ///
    /// # Errors
    /// - `InvalidSampleRate` for a zero sample rate
    /// - `InvalidParameter` for bad block/range settings, stages added to a
    ///   named class, or custom stages designed for another sample rate
    /// - design errors from the class's stages
    pub fn build(self) -> Result<Meter> {
        if self.sample_rate == 0 {
            return Err(LoudnessError::InvalidSampleRate(0.0));
        }

        let filter_class = match self.filter_class {
            FilterClass::Custom(mut stages) => {
                stages.extend(self.extra_stages);
                FilterClass::Custom(stages)
            }
            named if self.extra_stages.is_empty() => named,
            named => {
                return Err(LoudnessError::InvalidParameter(format!(
                    "custom stages require the custom filter class, not {named}"
                )))
            }
        };

        let rate = f64::from(self.sample_rate);
        let stages = filter_class.stages(rate)?;
        let gating_layout = BlockLayout::new(self.sample_rate, self.block_size, self.overlap)?;
        self.range.validate()?;
        let range_layout =
            BlockLayout::new(self.sample_rate, self.range.block_secs, self.range.overlap)?;

        debug!(
            sample_rate = self.sample_rate,
            filter_class = %filter_class,
            stages = stages.len(),
            block_len = gating_layout.block_len(),
            hop = gating_layout.hop(),
            "meter ready"
        );

        Ok(Meter {
            sample_rate: self.sample_rate,
            block_size: self.block_size,
            overlap: self.overlap,
            filter_class,
            stages,
            weights: self.weights,
            gating_layout,
            range: self.range,
            range_layout,
        })
    }
}
