//! Stateless inference over one owned window.
//!
//! normalize (scaler_x) -> model -> denormalize (scaler_y) -> clamp.

use std::sync::Arc;

use soh_traits::{Scaler, SequenceModel};

use crate::artifact_error::{inference_error, normalization_error};
use crate::error::SohError;
use crate::types::{FEATURES, SohPrediction, Window};
use crate::util::clamp_soh;

/// Model plus both scalers, fixed to one window size.
///
/// Read-only after construction; `run` takes `&self` and can be shared
/// through `Arc` by any number of callers.
#[derive(Clone)]
pub struct InferencePipeline {
    model: Arc<dyn SequenceModel>,
    scaler_x: Arc<dyn Scaler>,
    scaler_y: Arc<dyn Scaler>,
    window_size: usize,
}

impl core::fmt::Debug for InferencePipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InferencePipeline")
            .field("window_size", &self.window_size)
            .field("model_input", &self.model.input_shape())
            .field("scaler_x_features", &self.scaler_x.n_features())
            .field("scaler_y_features", &self.scaler_y.n_features())
            .finish()
    }
}

impl InferencePipeline {
    /// Assemble a pipeline, rejecting artifacts whose declared shapes disagree
    /// with `window_size × 3` in and one value out.
    pub fn new(
        model: Arc<dyn SequenceModel>,
        scaler_x: Arc<dyn Scaler>,
        scaler_y: Arc<dyn Scaler>,
        window_size: usize,
    ) -> Result<Self, SohError> {
        let pipeline = Self {
            model,
            scaler_x,
            scaler_y,
            window_size,
        };
        pipeline.check_shapes()?;
        Ok(pipeline)
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Compare every declared artifact shape against the configured window.
    ///
    /// Artifacts that do not declare a shape are accepted.
    pub fn check_shapes(&self) -> Result<(), SohError> {
        let expected = (self.window_size, FEATURES);
        if let Some(actual) = self.model.input_shape()
            && actual != expected
        {
            return Err(SohError::ShapeMismatch { expected, actual });
        }
        if let Some(n) = self.scaler_x.n_features()
            && n != FEATURES
        {
            return Err(SohError::ShapeMismatch {
                expected,
                actual: (self.window_size, n),
            });
        }
        if let Some(n) = self.scaler_y.n_features()
            && n != 1
        {
            return Err(SohError::ShapeMismatch {
                expected: (1, 1),
                actual: (1, n),
            });
        }
        Ok(())
    }

    /// Map one full window to a clamped SOH percentage.
    pub fn run(&self, window: &Window) -> Result<SohPrediction, SohError> {
        let expected = (self.window_size, FEATURES);
        if window.shape() != expected {
            return Err(SohError::ShapeMismatch {
                expected,
                actual: window.shape(),
            });
        }
        self.check_shapes()?;

        let raw = window.to_matrix();
        let scaled = self
            .scaler_x
            .transform(&raw, FEATURES)
            .map_err(|e| normalization_error("input scaler", &*e))?;
        if scaled.len() != raw.len() {
            return Err(SohError::Normalization(format!(
                "input scaler returned {} values for {} inputs",
                scaled.len(),
                raw.len()
            )));
        }
        if scaled.iter().any(|v| !v.is_finite()) {
            return Err(SohError::Normalization(
                "input scaler produced non-finite values".into(),
            ));
        }

        let out = self
            .model
            .predict(&scaled, self.window_size, FEATURES)
            .map_err(|e| inference_error(&*e))?;
        let y = match out.as_slice() {
            [y] if y.is_finite() => *y,
            [y] => return Err(SohError::Inference(format!("model output is {y}"))),
            other => {
                return Err(SohError::Inference(format!(
                    "expected a single output, got {}",
                    other.len()
                )));
            }
        };

        let decoded = self
            .scaler_y
            .inverse_transform(&[y], 1)
            .map_err(|e| normalization_error("output scaler", &*e))?;
        let soh = match decoded.as_slice() {
            [v] if v.is_finite() => *v,
            [v] => {
                return Err(SohError::Normalization(format!(
                    "decoded SOH is {v}"
                )));
            }
            other => {
                return Err(SohError::Normalization(format!(
                    "output scaler returned {} values",
                    other.len()
                )));
            }
        };

        let (value, was_clamped) = clamp_soh(soh);
        if was_clamped {
            tracing::warn!(raw = soh, clamped = value, "SOH outside [0, 100], clamped");
        }
        tracing::debug!(soh = value, normalized = y, "prediction");
        Ok(SohPrediction {
            value,
            was_clamped,
            unclamped: soh,
        })
    }
}
