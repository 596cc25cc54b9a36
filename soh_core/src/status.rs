//! Outcome of feeding one reading to the predictor.

use crate::types::SohPrediction;

/// Either a prediction or an explicit "not enough history yet".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Estimate {
    /// Warm-up: fewer than `window_size` readings seen so far.
    Buffering { filled: usize, window_size: usize },
    /// A full window was available and inference succeeded.
    Ready(SohPrediction),
}

impl Estimate {
    pub fn prediction(&self) -> Option<&SohPrediction> {
        match self {
            Self::Ready(p) => Some(p),
            Self::Buffering { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl From<Estimate> for Option<SohPrediction> {
    fn from(e: Estimate) -> Self {
        match e {
            Estimate::Ready(p) => Some(p),
            Estimate::Buffering { .. } => None,
        }
    }
}
