//! Human-readable error descriptions and structured JSON error formatting.

use soh_acquisition::AcqError;
use soh_artifacts::ArtifactError;
use soh_core::error::{BuildError, SohError};

/// Exit code for configuration problems (unreadable, unparsable, or invalid TOML).
pub const EXIT_CONFIG: i32 = 2;
/// Exit code when a model or scaler artifact cannot be loaded.
pub const EXIT_ARTIFACT: i32 = 3;
/// Exit code when artifacts and window size disagree.
pub const EXIT_SHAPE: i32 = 4;

/// Marker attached to config errors so they map to `EXIT_CONFIG`.
#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingModel
            | BuildError::MissingInputScaler
            | BuildError::MissingOutputScaler => format!(
                "What happened: The predictor was built without all of its artifacts ({be}).\nLikely causes: An artifact failed to load and was not passed to the builder.\nHow to fix: Check the [artifacts] paths in the config, then rerun."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SohError>() {
        return match se {
            SohError::ShapeMismatch { expected, actual } => format!(
                "What happened: Artifact shapes do not match the configured window (expected {expected:?}, got {actual:?}).\nLikely causes: [window] size differs from the window the model was trained on, or the scalers come from another training run.\nHow to fix: Set [window] size to the model's window_size, or export matching model and scaler files."
            ),
            SohError::Normalization(msg) => format!(
                "What happened: A scaler could not transform the data ({msg}).\nLikely causes: Scaler file fitted on a different feature set.\nHow to fix: Re-export scaler_x (3 features) and scaler_y (1 feature) from the training run."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(ae) = err.downcast_ref::<ArtifactError>() {
        let what = err.to_string();
        return match ae {
            ArtifactError::Io(_) => format!(
                "What happened: Could not read an artifact ({what}: {ae}).\nLikely causes: Wrong path in [artifacts], or the file is not readable.\nHow to fix: Relative paths are resolved from the config file's directory; fix the path and rerun."
            ),
            _ => format!(
                "What happened: An artifact file is invalid ({what}: {ae}).\nLikely causes: File was not produced by the export step, or was truncated.\nHow to fix: Re-export the model and scalers as JSON."
            ),
        };
    }

    if let Some(acq) = err.downcast_ref::<AcqError>() {
        return format!(
            "What happened: ThingSpeak request failed ({acq}).\nLikely causes: No network, wrong channel_id or read_api_key.\nHow to fix: Check the [thingspeak] table and connectivity."
        );
    }

    if let Some(ce) = err.downcast_ref::<ConfigError>() {
        return format!(
            "What happened: Configuration is invalid or incomplete ({ce}).\nLikely causes: Missing [artifacts] table, typo in a key, or out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    // Readings CSV header special-case
    if lower.contains("readings csv must have headers") {
        return "Invalid headers in readings CSV. Expected 'voltage,current,temperature'.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per failure class; anything unclassified returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() {
        return EXIT_CONFIG;
    }
    if err.downcast_ref::<ArtifactError>().is_some() {
        return EXIT_ARTIFACT;
    }
    if let Some(SohError::ShapeMismatch { .. }) = err.downcast_ref::<SohError>() {
        return EXIT_SHAPE;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<ConfigError>().is_some() {
        "Config"
    } else if err.downcast_ref::<ArtifactError>().is_some() {
        "Artifact"
    } else if let Some(se) = err.downcast_ref::<SohError>() {
        match se {
            SohError::ShapeMismatch { .. } => "ShapeMismatch",
            SohError::InvalidReading(_) => "InvalidReading",
            SohError::BufferNotReady { .. } => "BufferNotReady",
            SohError::Normalization(_) => "Normalization",
            SohError::Inference(_) => "Inference",
        }
    } else if err.downcast_ref::<BuildError>().is_some() {
        "Build"
    } else if err.downcast_ref::<AcqError>().is_some() {
        "Acquisition"
    } else {
        "Error"
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let base = json!({ "reason": reason_name(err), "message": humanize(err) });
    match err.downcast_ref::<SohError>() {
        Some(SohError::ShapeMismatch { expected, actual }) => json!({
            "reason": "ShapeMismatch",
            "details": { "expected": [expected.0, expected.1], "actual": [actual.0, actual.1] },
            "message": humanize(err),
        })
        .to_string(),
        _ => base.to_string(),
    }
}
