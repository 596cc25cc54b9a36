//! Per-feature affine scalers exported from the training pipeline.
//!
//! Both supported kinds reduce to `y = x * mul + add` per column, so they are
//! folded into one runtime type at load time.

use serde::Deserialize;
use soh_traits::{BoxError, Scaler};

use crate::error::{ArtifactError, Result};

/// On-disk scaler description.
///
/// ```json
/// { "kind": "min_max", "data_min": [2.5, -4.0, 0.0], "data_max": [4.2, 2.0, 60.0] }
/// { "kind": "standard", "mean": [3.6], "scale": [0.2] }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    MinMax {
        data_min: Vec<f64>,
        data_max: Vec<f64>,
        #[serde(default = "unit_range")]
        feature_range: (f64, f64),
    },
    Standard {
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
}

fn unit_range() -> (f64, f64) {
    (0.0, 1.0)
}

fn all_finite(v: &[f64]) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Fitted scaler ready for use on the hot path.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineScaler {
    mul: Vec<f64>,
    add: Vec<f64>,
}

impl AffineScaler {
    pub fn from_artifact(artifact: ScalerArtifact) -> Result<Self> {
        match artifact {
            ScalerArtifact::MinMax {
                data_min,
                data_max,
                feature_range: (lo, hi),
            } => {
                if data_min.is_empty() || data_min.len() != data_max.len() {
                    return Err(ArtifactError::Malformed(format!(
                        "min_max scaler needs equal, non-empty data_min/data_max (got {} and {})",
                        data_min.len(),
                        data_max.len()
                    )));
                }
                if !all_finite(&data_min) || !all_finite(&data_max) {
                    return Err(ArtifactError::Malformed(
                        "min_max scaler bounds must be finite".into(),
                    ));
                }
                if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                    return Err(ArtifactError::Malformed(format!(
                        "feature_range must satisfy lo < hi, got ({lo}, {hi})"
                    )));
                }
                let (mut mul, mut add) = (Vec::new(), Vec::new());
                for (min, max) in data_min.iter().zip(&data_max) {
                    // Constant features keep a unit range, as the fitting library does.
                    let range = if max - min == 0.0 { 1.0 } else { max - min };
                    let m = (hi - lo) / range;
                    mul.push(m);
                    add.push(lo - min * m);
                }
                Ok(Self { mul, add })
            }
            ScalerArtifact::Standard { mean, scale } => {
                if mean.is_empty() || mean.len() != scale.len() {
                    return Err(ArtifactError::Malformed(format!(
                        "standard scaler needs equal, non-empty mean/scale (got {} and {})",
                        mean.len(),
                        scale.len()
                    )));
                }
                if !all_finite(&mean) || !all_finite(&scale) {
                    return Err(ArtifactError::Malformed(
                        "standard scaler parameters must be finite".into(),
                    ));
                }
                let (mut mul, mut add) = (Vec::new(), Vec::new());
                for (mu, s) in mean.iter().zip(&scale) {
                    let s = if *s == 0.0 { 1.0 } else { *s };
                    mul.push(1.0 / s);
                    add.push(-mu / s);
                }
                Ok(Self { mul, add })
            }
        }
    }

    pub fn features(&self) -> usize {
        self.mul.len()
    }

    fn check(&self, data: &[f64], cols: usize) -> Result<()> {
        if cols != self.features() {
            return Err(ArtifactError::Columns {
                expected: self.features(),
                actual: cols,
            });
        }
        if cols == 0 || data.len() % cols != 0 {
            return Err(ArtifactError::Ragged {
                len: data.len(),
                cols,
            });
        }
        Ok(())
    }

    fn forward(&self, data: &[f64], cols: usize) -> Result<Vec<f64>> {
        self.check(data, cols)?;
        Ok(data
            .iter()
            .enumerate()
            .map(|(i, x)| x * self.mul[i % cols] + self.add[i % cols])
            .collect())
    }

    fn inverse(&self, data: &[f64], cols: usize) -> Result<Vec<f64>> {
        self.check(data, cols)?;
        Ok(data
            .iter()
            .enumerate()
            .map(|(i, y)| (y - self.add[i % cols]) / self.mul[i % cols])
            .collect())
    }
}

impl Scaler for AffineScaler {
    fn n_features(&self) -> Option<usize> {
        Some(self.features())
    }

    fn transform(&self, data: &[f64], cols: usize) -> std::result::Result<Vec<f64>, BoxError> {
        Ok(self.forward(data, cols)?)
    }

    fn inverse_transform(
        &self,
        data: &[f64],
        cols: usize,
    ) -> std::result::Result<Vec<f64>, BoxError> {
        Ok(self.inverse(data, cols)?)
    }
}

/// Parse a scaler from JSON text.
pub fn parse_scaler(json: &str) -> Result<AffineScaler> {
    let artifact: ScalerArtifact = serde_json::from_str(json)?;
    AffineScaler::from_artifact(artifact)
}

/// Load a scaler from a JSON file.
pub fn load_scaler(path: &std::path::Path) -> Result<AffineScaler> {
    let text = std::fs::read_to_string(path)?;
    let scaler = parse_scaler(&text)?;
    tracing::debug!(path = %path.display(), features = scaler.features(), "scaler loaded");
    Ok(scaler)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn min_max_maps_bounds_to_feature_range() {
        let s = parse_scaler(r#"{"kind":"min_max","data_min":[0.0,10.0],"data_max":[4.0,20.0]}"#)
            .unwrap();
        let out = s.forward(&[0.0, 10.0, 4.0, 20.0, 2.0, 15.0], 2).unwrap();
        let want = [0.0, 0.0, 1.0, 1.0, 0.5, 0.5];
        assert!(out.iter().zip(want).all(|(a, b)| close(*a, b)), "{out:?}");
    }

    #[test]
    fn min_max_custom_range_and_inverse() {
        let s = parse_scaler(
            r#"{"kind":"min_max","data_min":[60.0],"data_max":[100.0],"feature_range":[-1.0,1.0]}"#,
        )
        .unwrap();
        let fwd = s.forward(&[80.0], 1).unwrap();
        assert!(close(fwd[0], 0.0));
        let back = s.inverse(&[1.0], 1).unwrap();
        assert!(close(back[0], 100.0));
    }

    #[test]
    fn constant_feature_does_not_divide_by_zero() {
        let s = parse_scaler(r#"{"kind":"min_max","data_min":[5.0],"data_max":[5.0]}"#).unwrap();
        let out = s.forward(&[5.0, 6.0], 1).unwrap();
        assert!(close(out[0], 0.0));
        assert!(close(out[1], 1.0));
    }

    #[test]
    fn standard_scaler_centres_and_scales() {
        let s = parse_scaler(r#"{"kind":"standard","mean":[3.6],"scale":[0.2]}"#).unwrap();
        let out = s.forward(&[3.8], 1).unwrap();
        assert!(close(out[0], 1.0));
        let back = s.inverse(&[-2.0], 1).unwrap();
        assert!(close(back[0], 3.2));
    }

    #[test]
    fn rejects_wrong_column_count() {
        let s = parse_scaler(r#"{"kind":"standard","mean":[0.0,0.0,0.0],"scale":[1.0,1.0,1.0]}"#)
            .unwrap();
        let err = s.forward(&[1.0, 2.0], 2).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::Columns {
                expected: 3,
                actual: 2
            }
        ));
        let err = s.forward(&[1.0, 2.0, 3.0, 4.0], 3).unwrap_err();
        assert!(matches!(err, ArtifactError::Ragged { len: 4, cols: 3 }));
    }

    #[test]
    fn rejects_malformed_artifacts() {
        assert!(matches!(
            parse_scaler(r#"{"kind":"min_max","data_min":[0.0],"data_max":[1.0,2.0]}"#),
            Err(ArtifactError::Malformed(_))
        ));
        assert!(matches!(
            parse_scaler(
                r#"{"kind":"min_max","data_min":[0.0],"data_max":[1.0],"feature_range":[1.0,0.0]}"#
            ),
            Err(ArtifactError::Malformed(_))
        ));
        assert!(matches!(
            parse_scaler(r#"{"kind":"robust","center":[0.0]}"#),
            Err(ArtifactError::Json(_))
        ));
    }
}
