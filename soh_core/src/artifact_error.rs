//! Maps `Box<dyn Error>` from trait boundaries to typed `SohError`.
//!
//! Scalers and models report failures through `soh_traits::BoxError`. With the
//! `artifact-errors` feature the concrete `soh_artifacts::ArtifactError` is
//! downcast so a declared shape mismatch stays distinguishable from a plain
//! numeric failure.

use crate::error::SohError;

#[cfg(feature = "artifact-errors")]
fn shape_of(e: &(dyn std::error::Error + 'static)) -> Option<SohError> {
    match e.downcast_ref::<soh_artifacts::ArtifactError>()? {
        soh_artifacts::ArtifactError::InputShape { expected, actual } => {
            Some(SohError::ShapeMismatch {
                expected: *expected,
                actual: *actual,
            })
        }
        _ => None,
    }
}

#[cfg(not(feature = "artifact-errors"))]
fn shape_of(_e: &(dyn std::error::Error + 'static)) -> Option<SohError> {
    None
}

/// Map a scaler failure.
pub fn normalization_error(stage: &str, e: &(dyn std::error::Error + 'static)) -> SohError {
    SohError::Normalization(format!("{stage}: {e}"))
}

/// Map a model failure; a rejected input shape becomes `ShapeMismatch`.
pub fn inference_error(e: &(dyn std::error::Error + 'static)) -> SohError {
    shape_of(e).unwrap_or_else(|| SohError::Inference(e.to_string()))
}
