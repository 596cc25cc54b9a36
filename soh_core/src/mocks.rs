//! Test and helper doubles for the capability traits.

use std::collections::VecDeque;

use soh_traits::{BoxError, RawSample, ReadingSource, Scaler, SequenceModel};

/// Scaler that passes values through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityScaler {
    /// Declared feature count; `None` skips shape checks.
    pub features: Option<usize>,
}

impl IdentityScaler {
    pub const fn with_features(n: usize) -> Self {
        Self { features: Some(n) }
    }
}

impl Scaler for IdentityScaler {
    fn n_features(&self) -> Option<usize> {
        self.features
    }

    fn transform(&self, data: &[f64], _cols: usize) -> Result<Vec<f64>, BoxError> {
        Ok(data.to_vec())
    }

    fn inverse_transform(&self, data: &[f64], _cols: usize) -> Result<Vec<f64>, BoxError> {
        Ok(data.to_vec())
    }
}

/// Scaler that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingScaler;

impl Scaler for FailingScaler {
    fn transform(&self, _data: &[f64], _cols: usize) -> Result<Vec<f64>, BoxError> {
        Err("scaler unavailable".into())
    }

    fn inverse_transform(&self, _data: &[f64], _cols: usize) -> Result<Vec<f64>, BoxError> {
        Err("scaler unavailable".into())
    }
}

/// Model returning the same output for every window.
#[derive(Debug, Clone, Default)]
pub struct ConstModel {
    pub output: Vec<f64>,
    pub shape: Option<(usize, usize)>,
}

impl ConstModel {
    pub fn new(value: f64) -> Self {
        Self {
            output: vec![value],
            shape: None,
        }
    }

    #[must_use]
    pub fn with_shape(mut self, rows: usize, cols: usize) -> Self {
        self.shape = Some((rows, cols));
        self
    }
}

impl SequenceModel for ConstModel {
    fn input_shape(&self) -> Option<(usize, usize)> {
        self.shape
    }

    fn predict(&self, _input: &[f64], _rows: usize, _cols: usize) -> Result<Vec<f64>, BoxError> {
        Ok(self.output.clone())
    }
}

/// Model backed by a closure over `(input, rows, cols)`.
pub struct FnModel<F>(pub F);

impl<F> SequenceModel for FnModel<F>
where
    F: Fn(&[f64], usize, usize) -> Vec<f64> + Send + Sync,
{
    fn predict(&self, input: &[f64], rows: usize, cols: usize) -> Result<Vec<f64>, BoxError> {
        Ok((self.0)(input, rows, cols))
    }
}

/// Model that always errors with the given message.
#[derive(Debug, Clone)]
pub struct FailingModel(pub &'static str);

impl SequenceModel for FailingModel {
    fn predict(&self, _input: &[f64], _rows: usize, _cols: usize) -> Result<Vec<f64>, BoxError> {
        Err(self.0.into())
    }
}

/// Scripted source: yields each entry in order, then reports exhaustion.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    items: VecDeque<Result<RawSample, String>>,
}

impl ScriptedSource {
    pub fn new(items: impl IntoIterator<Item = Result<RawSample, String>>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    pub fn samples(samples: impl IntoIterator<Item = RawSample>) -> Self {
        Self::new(samples.into_iter().map(Ok))
    }
}

impl ReadingSource for ScriptedSource {
    fn next_sample(&mut self) -> Result<Option<RawSample>, BoxError> {
        match self.items.pop_front() {
            Some(Ok(s)) => Ok(Some(s)),
            Some(Err(msg)) => Err(msg.into()),
            None => Ok(None),
        }
    }
}
