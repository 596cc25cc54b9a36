//! `From` implementations bridging `soh_config` types to `soh_core` types.

use std::time::Duration;

use crate::config::{PredictorCfg, RunnerCfg};
use crate::types::Reading;

impl From<&soh_config::WindowCfg> for PredictorCfg {
    fn from(c: &soh_config::WindowCfg) -> Self {
        Self {
            window_size: c.size,
        }
    }
}

impl From<&soh_config::RunnerCfg> for RunnerCfg {
    fn from(c: &soh_config::RunnerCfg) -> Self {
        Self {
            poll_interval: Duration::from_millis(c.poll_interval_ms),
            channel_capacity: c.channel_capacity,
            ..Self::default()
        }
    }
}

impl From<&soh_config::ReadingRow> for Reading {
    fn from(r: &soh_config::ReadingRow) -> Self {
        Self::new(r.voltage, r.current, r.temperature)
    }
}
