#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Loaders for the exported model and scaler artifacts.
//!
//! Implements the `soh_traits::SequenceModel` and `soh_traits::Scaler` contracts
//! from JSON files produced at training time. The artifacts are immutable after
//! load and safe to share across threads.
pub mod error;
pub mod model;
pub mod scaler;

pub use error::ArtifactError;
pub use model::{ModelArtifact, SequenceRegressor, load_model, parse_model};
pub use scaler::{AffineScaler, ScalerArtifact, load_scaler, parse_scaler};

/// All three artifacts a predictor needs.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub model: SequenceRegressor,
    pub scaler_x: AffineScaler,
    pub scaler_y: AffineScaler,
}

/// Load model and both scalers, tagging failures with the offending path.
pub fn load_all(
    model: &std::path::Path,
    scaler_x: &std::path::Path,
    scaler_y: &std::path::Path,
) -> Result<ArtifactSet, (std::path::PathBuf, ArtifactError)> {
    let model = load_model(model).map_err(|e| (model.to_path_buf(), e))?;
    let scaler_x = load_scaler(scaler_x).map_err(|e| (scaler_x.to_path_buf(), e))?;
    let scaler_y = load_scaler(scaler_y).map_err(|e| (scaler_y.to_path_buf(), e))?;
    Ok(ArtifactSet {
        model,
        scaler_x,
        scaler_y,
    })
}
