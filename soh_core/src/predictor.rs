//! Realtime facade: one call per incoming reading.

use std::sync::{Arc, Mutex, PoisonError};

use crate::buffer::WindowBuffer;
use crate::builder::{Missing, SohPredictorBuilder};
use crate::error::{Result, SohError};
use crate::pipeline::InferencePipeline;
use crate::status::Estimate;
use crate::types::{BufferStatus, Reading, Window};

/// Buffer plus pipeline for a single reading stream.
///
/// Only the buffer carries state; the pipeline is immutable and shared.
#[derive(Debug)]
pub struct SohPredictor {
    pub(crate) buffer: WindowBuffer,
    pub(crate) pipeline: Arc<InferencePipeline>,
}

/// Buffer one reading and, when the window is full, run inference on it.
fn step(
    buffer: &mut WindowBuffer,
    reading: Reading,
) -> std::result::Result<Option<Window>, SohError> {
    if let Err(e) = buffer.push(reading) {
        tracing::warn!(error = %e, "reading rejected");
        return Err(e);
    }
    tracing::debug!(
        filled = buffer.len(),
        seen = buffer.count_seen(),
        "reading buffered"
    );
    if buffer.is_ready() {
        buffer.snapshot().map(Some)
    } else {
        Ok(None)
    }
}

fn finish(pipeline: &InferencePipeline, window: Option<Window>, filled: usize) -> Result<Estimate> {
    match window {
        Some(w) => Ok(Estimate::Ready(pipeline.run(&w)?)),
        None => Ok(Estimate::Buffering {
            filled,
            window_size: pipeline.window_size(),
        }),
    }
}

impl SohPredictor {
    /// Start building a predictor.
    pub fn builder() -> SohPredictorBuilder<Missing, Missing, Missing> {
        SohPredictorBuilder::default()
    }

    /// Feed one reading; returns `Buffering` until `window_size` readings were seen.
    ///
    /// Errors wrap a [`SohError`]; a rejected reading leaves the buffer untouched.
    pub fn predict_realtime(
        &mut self,
        voltage: f64,
        current: f64,
        temperature: f64,
    ) -> Result<Estimate> {
        self.predict_reading(Reading::new(voltage, current, temperature))
    }

    pub fn predict_reading(&mut self, reading: Reading) -> Result<Estimate> {
        let window = step(&mut self.buffer, reading)?;
        finish(&self.pipeline, window, self.buffer.len())
    }

    pub fn buffer_status(&self) -> BufferStatus {
        self.buffer.status()
    }

    pub fn window_size(&self) -> usize {
        self.pipeline.window_size()
    }

    pub fn pipeline(&self) -> &Arc<InferencePipeline> {
        &self.pipeline
    }

    /// Convert into a cloneable handle usable from several threads.
    pub fn into_shared(self) -> SharedPredictor {
        SharedPredictor {
            buffer: Arc::new(Mutex::new(self.buffer)),
            pipeline: self.pipeline,
        }
    }
}

/// Thread-safe handle over one reading stream.
///
/// Push and snapshot happen under a single lock so concurrent callers never
/// observe a torn window; inference runs outside the lock on the owned copy.
#[derive(Debug, Clone)]
pub struct SharedPredictor {
    buffer: Arc<Mutex<WindowBuffer>>,
    pipeline: Arc<InferencePipeline>,
}

impl SharedPredictor {
    pub fn predict_realtime(&self, voltage: f64, current: f64, temperature: f64) -> Result<Estimate> {
        self.predict_reading(Reading::new(voltage, current, temperature))
    }

    pub fn predict_reading(&self, reading: Reading) -> Result<Estimate> {
        let (window, filled) = {
            // The buffer is consistent after every push, so a poisoned lock is still usable.
            let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
            let window = step(&mut buffer, reading)?;
            (window, buffer.len())
        };
        finish(&self.pipeline, window, filled)
    }

    pub fn buffer_status(&self) -> BufferStatus {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .status()
    }

    pub fn window_size(&self) -> usize {
        self.pipeline.window_size()
    }
}
