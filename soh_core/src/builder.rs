//! Type-state builder for `SohPredictor` and the plain `build_predictor` constructor.
//!
//! The builder enforces at compile time that the model and both scalers are
//! provided before `build()` is available. `try_build()` is always available
//! for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use soh_traits::{Scaler, SequenceModel};

use crate::buffer::WindowBuffer;
use crate::config::PredictorCfg;
use crate::error::{BuildError, Result};
use crate::pipeline::InferencePipeline;
use crate::predictor::SohPredictor;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `SohPredictor`. Shapes are validated on `build()`.
pub struct SohPredictorBuilder<M, X, Y> {
    model: Option<Arc<dyn SequenceModel>>,
    scaler_x: Option<Arc<dyn Scaler>>,
    scaler_y: Option<Arc<dyn Scaler>>,
    cfg: PredictorCfg,
    _m: PhantomData<M>,
    _x: PhantomData<X>,
    _y: PhantomData<Y>,
}

impl Default for SohPredictorBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            model: None,
            scaler_x: None,
            scaler_y: None,
            cfg: PredictorCfg::default(),
            _m: PhantomData,
            _x: PhantomData,
            _y: PhantomData,
        }
    }
}

/// Validate configuration and assemble the predictor.
///
/// Shared by `SohPredictorBuilder::try_build()` and `build_predictor()`.
fn validate_and_build(
    model: Arc<dyn SequenceModel>,
    scaler_x: Arc<dyn Scaler>,
    scaler_y: Arc<dyn Scaler>,
    cfg: &PredictorCfg,
) -> Result<SohPredictor> {
    if cfg.window_size == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "window_size must be >= 1",
        )));
    }
    let pipeline = InferencePipeline::new(model, scaler_x, scaler_y, cfg.window_size)?;
    tracing::debug!(window_size = cfg.window_size, "predictor built");
    Ok(SohPredictor {
        buffer: WindowBuffer::new(cfg.window_size),
        pipeline: Arc::new(pipeline),
    })
}

impl<M, X, Y> SohPredictorBuilder<M, X, Y> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<SohPredictor> {
        let model = self
            .model
            .ok_or_else(|| eyre::Report::new(BuildError::MissingModel))?;
        let scaler_x = self
            .scaler_x
            .ok_or_else(|| eyre::Report::new(BuildError::MissingInputScaler))?;
        let scaler_y = self
            .scaler_y
            .ok_or_else(|| eyre::Report::new(BuildError::MissingOutputScaler))?;
        validate_and_build(model, scaler_x, scaler_y, &self.cfg)
    }

    /// Readings per model input (default 10).
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.cfg.window_size = window_size;
        self
    }

    pub fn with_config(mut self, cfg: PredictorCfg) -> Self {
        self.cfg = cfg;
        self
    }

    fn retag<M2, X2, Y2>(self) -> SohPredictorBuilder<M2, X2, Y2> {
        SohPredictorBuilder {
            model: self.model,
            scaler_x: self.scaler_x,
            scaler_y: self.scaler_y,
            cfg: self.cfg,
            _m: PhantomData,
            _x: PhantomData,
            _y: PhantomData,
        }
    }
}

// Setters that advance type-state
impl<X, Y> SohPredictorBuilder<Missing, X, Y> {
    pub fn with_model(self, model: impl SequenceModel + 'static) -> SohPredictorBuilder<Set, X, Y> {
        self.with_shared_model(Arc::new(model))
    }

    pub fn with_shared_model(mut self, model: Arc<dyn SequenceModel>) -> SohPredictorBuilder<Set, X, Y> {
        self.model = Some(model);
        self.retag()
    }
}

impl<M, Y> SohPredictorBuilder<M, Missing, Y> {
    pub fn with_input_scaler(self, scaler: impl Scaler + 'static) -> SohPredictorBuilder<M, Set, Y> {
        self.with_shared_input_scaler(Arc::new(scaler))
    }

    pub fn with_shared_input_scaler(mut self, scaler: Arc<dyn Scaler>) -> SohPredictorBuilder<M, Set, Y> {
        self.scaler_x = Some(scaler);
        self.retag()
    }
}

impl<M, X> SohPredictorBuilder<M, X, Missing> {
    pub fn with_output_scaler(self, scaler: impl Scaler + 'static) -> SohPredictorBuilder<M, X, Set> {
        self.with_shared_output_scaler(Arc::new(scaler))
    }

    pub fn with_shared_output_scaler(mut self, scaler: Arc<dyn Scaler>) -> SohPredictorBuilder<M, X, Set> {
        self.scaler_y = Some(scaler);
        self.retag()
    }
}

impl SohPredictorBuilder<Set, Set, Set> {
    /// Validate and build. Only available when the model and both scalers are set.
    pub fn build(self) -> Result<SohPredictor> {
        self.try_build()
    }
}

/// Build a predictor directly from shared artifacts.
///
/// Delegates to the same validation as the builder.
pub fn build_predictor(
    model: Arc<dyn SequenceModel>,
    scaler_x: Arc<dyn Scaler>,
    scaler_y: Arc<dyn Scaler>,
    cfg: &PredictorCfg,
) -> Result<SohPredictor> {
    validate_and_build(model, scaler_x, scaler_y, cfg)
}
