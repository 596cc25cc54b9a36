#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Realtime battery state-of-health estimation (artifact-agnostic).
//!
//! This crate turns a stream of `(voltage, current, temperature)` readings into
//! SOH percentages. The trained model and the scalers are reached only through
//! `soh_traits::SequenceModel` and `soh_traits::Scaler`.
//!
//! ## Architecture
//!
//! - **Buffer**: fixed-capacity FIFO of the latest readings (`buffer` module)
//! - **Pipeline**: normalize, infer, denormalize, clamp (`pipeline` module)
//! - **Facade**: one call per reading, `Buffering` during warm-up (`predictor` module)
//! - **Runner**: feeder thread plus loop with per-run counters (`runner`, `feeder`)
//!
//! ## Example
//!
//! ```
//! use soh_core::mocks::{ConstModel, IdentityScaler};
//! use soh_core::{Estimate, SohPredictor};
//!
//! let mut p = SohPredictor::builder()
//!     .with_model(ConstModel::new(87.5))
//!     .with_input_scaler(IdentityScaler::default())
//!     .with_output_scaler(IdentityScaler::default())
//!     .with_window_size(2)
//!     .build()?;
//! assert!(matches!(p.predict_realtime(3.7, -1.0, 25.0)?, Estimate::Buffering { filled: 1, .. }));
//! let soh = p.predict_realtime(3.7, -1.0, 25.0)?;
//! assert_eq!(soh.prediction().map(|s| s.value), Some(87.5));
//! # Ok::<(), eyre::Report>(())
//! ```

pub mod artifact_error;
pub mod buffer;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod feeder;
pub mod mocks;
pub mod pipeline;
pub mod predictor;
pub mod runner;
pub mod status;
pub mod types;
pub mod util;

pub use buffer::WindowBuffer;
pub use builder::{Missing, Set, SohPredictorBuilder, build_predictor};
pub use config::{PredictorCfg, RunnerCfg};
pub use error::{BuildError, Report, Result, SohError};
pub use feeder::{FeedItem, Feeder};
pub use pipeline::InferencePipeline;
pub use predictor::{SharedPredictor, SohPredictor};
pub use runner::{RunEvent, RunStats, RunSummary, StopReason};
pub use status::Estimate;
pub use types::{BufferStatus, FEATURES, Reading, SohPrediction, Window};
