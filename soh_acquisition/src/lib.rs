#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Reading sources feeding the SOH core.
//!
//! Every source implements `soh_traits::ReadingSource` and yields samples in
//! arrival order. None of them validate values; that happens in the core.
pub mod error;
pub mod thingspeak;

use soh_traits::{BoxError, RawSample, ReadingSource};
use std::collections::VecDeque;

pub use error::AcqError;
pub use thingspeak::{
    FeedEntry, FieldMap, ThingSpeakParams, ThingSpeakSource, decode_response, parse_feed,
};

/// Replays a fixed list of samples, then reports exhaustion.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    queue: VecDeque<RawSample>,
}

impl ReplaySource {
    pub fn new(samples: impl IntoIterator<Item = RawSample>) -> Self {
        Self {
            queue: samples.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl ReadingSource for ReplaySource {
    fn next_sample(&mut self) -> Result<Option<RawSample>, BoxError> {
        Ok(self.queue.pop_front())
    }
}

/// Deterministic discharge profile for demos and tests.
///
/// Voltage sags linearly over each `cycle_len` samples with a small ripple,
/// current hovers around a 1.5 A discharge, temperature drifts slowly.
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    tick: u64,
    limit: Option<u64>,
    cycle_len: u64,
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self {
            tick: 0,
            limit: None,
            cycle_len: 200,
        }
    }

    /// Stop after `n` samples.
    pub fn with_limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    #[allow(clippy::cast_precision_loss)]
    fn sample_at(&self, tick: u64) -> RawSample {
        let t = tick as f64;
        let phase = (tick % self.cycle_len) as f64 / self.cycle_len as f64;
        let voltage = 0.01f64.mul_add((t * 0.7).sin(), 0.7f64.mul_add(-phase, 4.2));
        let current = 0.05f64.mul_add((t * 0.3).sin(), -1.5);
        let temperature = 3.0f64.mul_add((t / 20.0).sin(), 25.0);
        RawSample::new(voltage, current, temperature)
    }
}

impl ReadingSource for SimulatedSource {
    fn next_sample(&mut self) -> Result<Option<RawSample>, BoxError> {
        if self.limit.is_some_and(|n| self.tick >= n) {
            return Ok(None);
        }
        let s = self.sample_at(self.tick);
        self.tick += 1;
        tracing::trace!(
            tick = self.tick,
            voltage = s.voltage,
            current = s.current,
            temperature = s.temperature,
            "simulated sample"
        );
        Ok(Some(s))
    }
}
