use crate::error::NowcastError;
use crate::sample::Sample;
use crate::{FEATURES, LOOKBACK};

/// The newest [`LOOKBACK`] samples, copied out of the history for one
/// inference call.
#[derive(Debug, Clone, PartialEq)]
pub struct LookbackWindow {
    samples: Vec<Sample>,
}

impl LookbackWindow {
    /// Model input shape: one batch of `LOOKBACK` timesteps with `FEATURES` each.
    pub const SHAPE: [usize; 3] = [1, LOOKBACK, FEATURES];

    pub fn new(samples: Vec<Sample>) -> Result<Self, NowcastError> {
        if samples.len() != LOOKBACK {
            return Err(NowcastError::Inference(format!(
                "expected window of {} samples, got {}",
                LOOKBACK,
                samples.len()
            )));
        }
        Ok(Self { samples })
    }

    /// For callers that already took exactly [`LOOKBACK`] samples.
    pub(crate) fn from_tail(samples: Vec<Sample>) -> Self {
        debug_assert_eq!(samples.len(), LOOKBACK);
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Row-major `[1, LOOKBACK, FEATURES]` input buffer, oldest timestep first.
    pub fn to_input(&self) -> Vec<f32> {
        self.samples.iter().flat_map(Sample::features).collect()
    }
}
