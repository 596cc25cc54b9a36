use thiserror::Error;

/// Failures of the windowing and inference pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SohError {
    /// Non-finite or malformed reading; the buffer is left untouched.
    #[error("invalid reading: {0}")]
    InvalidReading(String),
    /// Snapshot requested before warm-up completed.
    #[error("buffer not ready: {seen}/{required} readings")]
    BufferNotReady { seen: u64, required: usize },
    /// Window or artifact shape disagrees with the configured window.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// A scaler rejected its input or produced non-finite values.
    #[error("normalization error: {0}")]
    Normalization(String),
    /// The model failed or returned something other than one finite scalar.
    #[error("inference error: {0}")]
    Inference(String),
}

impl SohError {
    /// Misconfiguration that will fail identically on every reading.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ShapeMismatch { .. })
    }
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing model")]
    MissingModel,
    #[error("missing input scaler")]
    MissingInputScaler,
    #[error("missing output scaler")]
    MissingOutputScaler,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
