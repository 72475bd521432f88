//! Loudness measurement per ITU-R BS.1770-4 and EBU R128
//!
//! This crate provides:
//! - Integrated (gated) loudness in LUFS
//! - Loudness range (LRA) in LU, per EBU Tech 3342
//! - The weighting filters behind them (K-weighting and alternative classes)
//! - Peak and loudness normalization helpers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ AudioBuffer │ ──► │ Filter       │ ──► │ Block Energy  │
//! └─────────────┘     │ Cascade      │     └───────────────┘
//!                     └──────────────┘        │         │
//!                                             ▼         ▼
//!                                   ┌──────────────┐ ┌──────────────┐
//!                                   │ Gating       │ │ Loudness     │
//!                                   │ (400 ms)     │ │ Range (3 s)  │
//!                                   └──────────────┘ └──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use lufs_meter::{normalize, AudioBuffer, Meter};
//!
//! let meter = Meter::new(48000)?;
//! let buffer = AudioBuffer::from_interleaved_f32(&samples, 2)?;
//!
//! let lufs = meter.integrated_loudness(&buffer)?;
//! println!("Integrated loudness: {:.1} LUFS", lufs);
//!
//! let normalized = normalize::loudness(&buffer, lufs, -23.0)?;
//! ```

#![deny(unsafe_code)]

mod blocks;
mod buffer;
mod channel;
mod config;
mod error;
pub mod filter;
pub mod gating;
mod meter;
pub mod normalize;
pub mod range;

pub use blocks::{blocks, Block, BlockLayout, Blocks};
pub use buffer::AudioBuffer;
pub use channel::ChannelWeights;
pub use config::{MeterConfig, RangeConfig, StageConfig};
pub use error::{LoudnessError, Result};
pub use filter::{make_filter, FilterClass, FilterStage, FilterType};
pub use gating::GatingReport;
pub use meter::{LoudnessReport, Meter, MeterBuilder};
pub use normalize::LoudnessTarget;
pub use range::RangeSettings;

/// Most channels a buffer may carry (L, R, C, Ls, Rs)
pub const MAX_CHANNELS: usize = 5;

/// Default gating block duration in seconds
pub const DEFAULT_BLOCK_SECS: f64 = 0.4;

/// Default overlap between gating blocks
pub const DEFAULT_OVERLAP: f64 = 0.75;

/// EBU R128 broadcast reference level (-23 LUFS)
pub const EBU_R128_BROADCAST_LUFS: f64 = -23.0;

/// Common streaming platform level (-14 LUFS)
pub const STREAMING_LUFS: f64 = -14.0;

/// ReplayGain 2.0 reference loudness level (-18 LUFS)
pub const REPLAYGAIN_REFERENCE_LUFS: f64 = -18.0;
