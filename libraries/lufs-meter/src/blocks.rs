//! Block energy accumulation
//!
//! A filtered buffer is cut into fixed-length, overlapping gating blocks.
//! Each block carries the mean square of every channel over its window.
//! Blocks only ever cover whole windows: a trailing remainder shorter than
//! one block is dropped.

use crate::buffer::AudioBuffer;
use crate::error::{LoudnessError, Result};

/// Block length and hop, in samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    block_len: usize,
    hop: usize,
}

impl BlockLayout {
    /// Derive the layout for `block_secs` windows overlapping by `overlap`
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz
    /// * `block_secs` - Window duration in seconds
    /// * `overlap` - Fraction of a window shared with the next, in [0, 1)
    ///
    /// # Errors
    /// Returns error if the window is empty at this sample rate or the
    /// overlap is out of range.
    pub fn new(sample_rate: u32, block_secs: f64, overlap: f64) -> Result<Self> {
        if !(block_secs.is_finite() && block_secs > 0.0) {
            return Err(LoudnessError::InvalidParameter(format!(
                "block size must be positive, got {block_secs} s"
            )));
        }
        if !(0.0..1.0).contains(&overlap) {
            return Err(LoudnessError::InvalidParameter(format!(
                "overlap must be in [0, 1), got {overlap}"
            )));
        }

        let rate = f64::from(sample_rate);
        let block_len = (block_secs * rate).round() as usize;
        if block_len == 0 {
            return Err(LoudnessError::InvalidParameter(format!(
                "block of {block_secs} s is empty at {sample_rate} Hz"
            )));
        }
        let hop = ((block_secs * (1.0 - overlap) * rate).round() as usize).max(1);

        Ok(Self { block_len, hop })
    }

    /// Samples per block
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Samples between consecutive block starts
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of whole blocks in `frames` samples
    pub fn count(&self, frames: usize) -> usize {
        if frames < self.block_len {
            0
        } else {
            (frames - self.block_len) / self.hop + 1
        }
    }
}

/// One gating block
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// First sample of the window
    pub start: usize,
    /// Window length in samples
    pub len: usize,
    /// Mean square per channel
    pub mean_square: Vec<f64>,
}

/// Lazy sequence of blocks over a buffer
///
/// Created by [`blocks`]. Yields nothing when the buffer is shorter than
/// one block.
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    buffer: &'a AudioBuffer,
    layout: BlockLayout,
    next: usize,
    count: usize,
}

impl Iterator for Blocks<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if self.next >= self.count {
            return None;
        }

        let start = self.next * self.layout.hop;
        let len = self.layout.block_len;
        self.next += 1;

        let mean_square = self
            .buffer
            .iter_channels()
            .map(|ch| ch[start..start + len].iter().map(|s| s * s).sum::<f64>() / len as f64)
            .collect();

        Some(Block {
            start,
            len,
            mean_square,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Blocks<'_> {}

/// Partition `buffer` into blocks described by `layout`
pub fn blocks(buffer: &AudioBuffer, layout: BlockLayout) -> Blocks<'_> {
    Blocks {
        buffer,
        layout,
        next: 0,
        count: layout.count(buffer.frames()),
    }
}
