//! Runtime configuration for the predictor and the runner.
//!
//! Separate from the TOML-deserialized config in `soh_config`; see
//! `conversions` for the mapping.

use std::time::Duration;

/// Predictor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictorCfg {
    /// Readings per model input. Must match the artifacts' declared shape.
    pub window_size: usize,
}

impl Default for PredictorCfg {
    fn default() -> Self {
        Self {
            window_size: soh_config::DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Acquisition loop configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerCfg {
    /// Pause between two source polls. Zero polls back to back.
    pub poll_interval: Duration,
    /// Bound of the feeder -> predictor channel (min 1).
    pub channel_capacity: usize,
    /// Emit a summary log line every this many predictions (0 disables).
    pub log_every: u64,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(16),
            channel_capacity: 64,
            log_every: 10,
        }
    }
}
