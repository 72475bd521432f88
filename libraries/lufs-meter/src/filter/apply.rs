//! Running a stage cascade over a buffer

use super::design::{Coefficients, FilterStage};
use crate::buffer::AudioBuffer;
use tracing::trace;

/// Direct-form I history for one channel of one stage
///
/// Starts from rest (all zeros). The cold start produces a short transient
/// at the beginning of the signal that is negligible next to a 400 ms
/// gating block.
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    #[inline]
    fn process(&mut self, c: &Coefficients, x0: f64) -> f64 {
        let y0 = c.b0 * x0 + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x0;
        self.y2 = self.y1;
        self.y1 = y0;

        y0
    }
}

/// Filter one channel through a single stage, returning a new vector
pub fn apply_stage(stage: &FilterStage, samples: &[f64]) -> Vec<f64> {
    let coefficients = stage.coefficients();
    let gain = stage.passband_gain();
    let mut state = BiquadState::default();

    samples
        .iter()
        .map(|&x| gain * state.process(coefficients, x))
        .collect()
}

/// Filter every channel of `buffer` through `stages` in order
///
/// The output of stage `i` is the input of stage `i + 1`. Channels are
/// independent. An empty cascade returns an unmodified copy.
pub fn apply_cascade(stages: &[FilterStage], buffer: &AudioBuffer) -> AudioBuffer {
    let channels = buffer
        .iter_channels()
        .map(|samples| {
            stages
                .iter()
                .fold(samples.to_vec(), |signal, stage| {
                    trace!(filter_type = %stage.filter_type(), "applying stage");
                    apply_stage(stage, &signal)
                })
        })
        .collect();

    AudioBuffer::from_validated(channels)
}
