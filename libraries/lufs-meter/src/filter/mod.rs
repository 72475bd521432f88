//! Frequency-weighting filters
//!
//! - `design`: biquad coefficients for a single stage
//! - `class`: named stage lists (K-weighting and friends)
//! - `apply`: running a cascade over a buffer

mod apply;
mod class;
mod design;

pub use apply::{apply_cascade, apply_stage};
pub use class::FilterClass;
pub use design::{make_filter, Coefficients, FilterStage, FilterType};
