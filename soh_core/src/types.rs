//! Value types flowing through the buffer and pipeline.

use crate::error::SohError;

/// Columns per reading: voltage, current, temperature.
pub const FEATURES: usize = 3;

/// One sensor observation. Ordering is implied by arrival.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    voltage: f64,
    current: f64,
    temperature: f64,
}

impl Reading {
    /// Build a reading; finiteness is enforced when it is pushed.
    pub const fn new(voltage: f64, current: f64, temperature: f64) -> Self {
        Self {
            voltage,
            current,
            temperature,
        }
    }

    pub const fn voltage(&self) -> f64 {
        self.voltage
    }

    pub const fn current(&self) -> f64 {
        self.current
    }

    pub const fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Feature row in model column order.
    pub const fn as_row(&self) -> [f64; FEATURES] {
        [self.voltage, self.current, self.temperature]
    }

    /// Build a reading, rejecting NaN and ±Inf.
    pub fn try_new(voltage: f64, current: f64, temperature: f64) -> Result<Self, SohError> {
        let r = Self::new(voltage, current, temperature);
        r.validate()?;
        Ok(r)
    }

    /// Reject NaN and ±Inf in any field.
    pub fn validate(&self) -> Result<(), SohError> {
        for (name, v) in [
            ("voltage", self.voltage),
            ("current", self.current),
            ("temperature", self.temperature),
        ] {
            if !v.is_finite() {
                return Err(SohError::InvalidReading(format!("{name} is {v}")));
            }
        }
        Ok(())
    }
}

impl From<soh_traits::RawSample> for Reading {
    fn from(s: soh_traits::RawSample) -> Self {
        Self::new(s.voltage, s.current, s.temperature)
    }
}

/// Owned, oldest-first copy of the most recent readings.
///
/// Later pushes to the buffer never affect a window already handed out.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    readings: Vec<Reading>,
}

impl Window {
    pub fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// `(rows, cols)` of the matrix this window flattens to.
    pub fn shape(&self) -> (usize, usize) {
        (self.readings.len(), FEATURES)
    }

    /// Row-major `len × 3` matrix, oldest row first.
    pub fn to_matrix(&self) -> Vec<f64> {
        self.readings.iter().flat_map(Reading::as_row).collect()
    }
}

/// Result of one inference call, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SohPrediction {
    /// Always within `[0, 100]`.
    pub value: f64,
    /// True when the decoded value was outside `[0, 100]` and got clamped.
    pub was_clamped: bool,
    /// Decoded value before clamping.
    pub unclamped: f64,
}

/// Fill level of the window buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStatus {
    pub filled: usize,
    pub capacity: usize,
    pub count_seen: u64,
    pub ready: bool,
}
