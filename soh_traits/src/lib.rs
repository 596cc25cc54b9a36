//! Capability contracts shared across the SOH workspace.
//!
//! The core never talks to a concrete model, scaler, or data feed. It only sees
//! these traits, so tests can inject deterministic stubs and the real artifacts
//! can live in their own crate.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Boxed error used at every trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One unvalidated observation as delivered by an acquisition source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub voltage: f64,
    pub current: f64,
    pub temperature: f64,
}

impl RawSample {
    pub const fn new(voltage: f64, current: f64, temperature: f64) -> Self {
        Self {
            voltage,
            current,
            temperature,
        }
    }
}

/// Pre-fitted feature transform.
///
/// Matrices are row-major with `cols` columns; `data.len()` must be a multiple of `cols`.
pub trait Scaler: Send + Sync {
    /// Number of features the scaler was fitted on, if it knows.
    fn n_features(&self) -> Option<usize> {
        None
    }

    fn transform(&self, data: &[f64], cols: usize) -> Result<Vec<f64>, BoxError>;

    fn inverse_transform(&self, data: &[f64], cols: usize) -> Result<Vec<f64>, BoxError>;
}

/// Trained sequence model: `(rows, cols)` matrix in, output vector out.
pub trait SequenceModel: Send + Sync {
    /// Input shape `(rows, cols)` the model was trained on, if declared.
    fn input_shape(&self) -> Option<(usize, usize)> {
        None
    }

    fn predict(&self, input: &[f64], rows: usize, cols: usize) -> Result<Vec<f64>, BoxError>;
}

/// Pull-based feed of sensor samples.
pub trait ReadingSource {
    /// Next sample in arrival order; `Ok(None)` once the stream is exhausted.
    fn next_sample(&mut self) -> Result<Option<RawSample>, BoxError>;
}

impl<T: ReadingSource + ?Sized> ReadingSource for Box<T> {
    fn next_sample(&mut self) -> Result<Option<RawSample>, BoxError> {
        (**self).next_sample()
    }
}
