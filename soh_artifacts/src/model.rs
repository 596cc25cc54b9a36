//! Stacked-LSTM regressor evaluated from exported weights.
//!
//! Weight layout follows the usual Keras export: an LSTM `kernel` is
//! `[input_dim][4 * units]`, `recurrent_kernel` is `[units][4 * units]` and `bias`
//! is `[4 * units]`, with gates packed in the order input, forget, cell, output.
//! Dropout layers are identities at inference and are discarded on load.

use serde::Deserialize;
use soh_traits::{BoxError, SequenceModel};

use crate::error::{ArtifactError, Result};

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    #[inline]
    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Linear => x,
            Self::Relu => x.max(0.0),
            Self::Sigmoid => sigmoid(x),
            Self::Tanh => x.tanh(),
        }
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerArtifact {
    Lstm {
        units: usize,
        kernel: Vec<Vec<f64>>,
        recurrent_kernel: Vec<Vec<f64>>,
        bias: Vec<f64>,
        #[serde(default)]
        return_sequences: bool,
    },
    Dropout {
        #[allow(dead_code)]
        rate: f64,
    },
    Dense {
        units: usize,
        kernel: Vec<Vec<f64>>,
        bias: Vec<f64>,
        #[serde(default)]
        activation: Activation,
    },
}

/// On-disk model description.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    pub window_size: usize,
    pub n_features: usize,
    pub layers: Vec<LayerArtifact>,
}

#[derive(Debug, Clone)]
struct LstmLayer {
    units: usize,
    input_dim: usize,
    // Row-major [input_dim][4 * units]
    kernel: Vec<f64>,
    // Row-major [units][4 * units]
    recurrent: Vec<f64>,
    bias: Vec<f64>,
    return_sequences: bool,
}

#[derive(Debug, Clone)]
struct DenseLayer {
    units: usize,
    input_dim: usize,
    // Row-major [input_dim][units]
    kernel: Vec<f64>,
    bias: Vec<f64>,
    activation: Activation,
}

#[derive(Debug, Clone)]
enum Layer {
    Lstm(LstmLayer),
    Dense(DenseLayer),
}

/// Activations flowing between layers.
enum Tensor {
    Seq(Vec<Vec<f64>>),
    Flat(Vec<f64>),
}

fn flatten_checked(
    name: &str,
    rows: Vec<Vec<f64>>,
    expect_rows: usize,
    expect_cols: usize,
) -> Result<Vec<f64>> {
    if rows.len() != expect_rows {
        return Err(ArtifactError::Malformed(format!(
            "{name}: expected {expect_rows} rows, got {}",
            rows.len()
        )));
    }
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != expect_cols) {
        return Err(ArtifactError::Malformed(format!(
            "{name}: row {i} has {} columns, expected {expect_cols}",
            row.len()
        )));
    }
    // Sized from the data actually present, never from declared dimensions.
    let flat = rows.concat();
    if flat.iter().any(|v| !v.is_finite()) {
        return Err(ArtifactError::Malformed(format!(
            "{name}: contains non-finite weights"
        )));
    }
    Ok(flat)
}

fn check_bias(name: &str, bias: &[f64], len: usize) -> Result<()> {
    if bias.len() != len {
        return Err(ArtifactError::Malformed(format!(
            "{name}: bias has {} entries, expected {len}",
            bias.len()
        )));
    }
    if bias.iter().any(|v| !v.is_finite()) {
        return Err(ArtifactError::Malformed(format!(
            "{name}: contains non-finite bias"
        )));
    }
    Ok(())
}

impl LstmLayer {
    fn forward(&self, seq: &[Vec<f64>]) -> Tensor {
        let u = self.units;
        let mut h = vec![0.0; u];
        let mut c = vec![0.0; u];
        let mut z = vec![0.0; 4 * u];
        let mut outputs = Vec::with_capacity(if self.return_sequences { seq.len() } else { 0 });

        for x in seq {
            z.copy_from_slice(&self.bias);
            for (k, xk) in x.iter().enumerate() {
                let row = &self.kernel[k * 4 * u..(k + 1) * 4 * u];
                for (zj, w) in z.iter_mut().zip(row) {
                    *zj += xk * w;
                }
            }
            for (k, hk) in h.iter().enumerate() {
                let row = &self.recurrent[k * 4 * u..(k + 1) * 4 * u];
                for (zj, w) in z.iter_mut().zip(row) {
                    *zj += hk * w;
                }
            }
            for j in 0..u {
                let i_g = sigmoid(z[j]);
                let f_g = sigmoid(z[u + j]);
                let c_g = z[2 * u + j].tanh();
                let o_g = sigmoid(z[3 * u + j]);
                c[j] = f_g * c[j] + i_g * c_g;
                h[j] = o_g * c[j].tanh();
            }
            if self.return_sequences {
                outputs.push(h.clone());
            }
        }

        if self.return_sequences {
            Tensor::Seq(outputs)
        } else {
            Tensor::Flat(h)
        }
    }
}

impl DenseLayer {
    fn forward_vec(&self, x: &[f64]) -> Vec<f64> {
        let mut y = self.bias.clone();
        for (k, xk) in x.iter().enumerate() {
            let row = &self.kernel[k * self.units..(k + 1) * self.units];
            for (yj, w) in y.iter_mut().zip(row) {
                *yj += xk * w;
            }
        }
        for v in &mut y {
            *v = self.activation.apply(*v);
        }
        y
    }
}

/// Sequence model reconstructed from a [`ModelArtifact`].
#[derive(Debug, Clone)]
pub struct SequenceRegressor {
    window_size: usize,
    n_features: usize,
    layers: Vec<Layer>,
}

impl SequenceRegressor {
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        if artifact.window_size == 0 || artifact.n_features == 0 {
            return Err(ArtifactError::Malformed(
                "window_size and n_features must be >= 1".into(),
            ));
        }
        let mut dim = artifact.n_features;
        let mut sequential = true;
        let mut layers = Vec::new();

        for (idx, layer) in artifact.layers.into_iter().enumerate() {
            match layer {
                LayerArtifact::Lstm {
                    units,
                    kernel,
                    recurrent_kernel,
                    bias,
                    return_sequences,
                } => {
                    let name = format!("layer {idx} (lstm)");
                    if !sequential {
                        return Err(ArtifactError::Malformed(format!(
                            "{name}: needs sequence input; set return_sequences on the previous lstm"
                        )));
                    }
                    if units == 0 {
                        return Err(ArtifactError::Malformed(format!("{name}: units must be >= 1")));
                    }
                    let gates = units.checked_mul(4).ok_or_else(|| {
                        ArtifactError::Malformed(format!("{name}: units {units} is too large"))
                    })?;
                    let kernel = flatten_checked(&format!("{name} kernel"), kernel, dim, gates)?;
                    let recurrent = flatten_checked(
                        &format!("{name} recurrent_kernel"),
                        recurrent_kernel,
                        units,
                        gates,
                    )?;
                    check_bias(&name, &bias, gates)?;
                    layers.push(Layer::Lstm(LstmLayer {
                        units,
                        input_dim: dim,
                        kernel,
                        recurrent,
                        bias,
                        return_sequences,
                    }));
                    dim = units;
                    sequential = return_sequences;
                }
                LayerArtifact::Dropout { .. } => {}
                LayerArtifact::Dense {
                    units,
                    kernel,
                    bias,
                    activation,
                } => {
                    let name = format!("layer {idx} (dense)");
                    if units == 0 {
                        return Err(ArtifactError::Malformed(format!("{name}: units must be >= 1")));
                    }
                    let kernel = flatten_checked(&format!("{name} kernel"), kernel, dim, units)?;
                    check_bias(&name, &bias, units)?;
                    layers.push(Layer::Dense(DenseLayer {
                        units,
                        input_dim: dim,
                        kernel,
                        bias,
                        activation,
                    }));
                    dim = units;
                }
            }
        }

        if layers.is_empty() {
            return Err(ArtifactError::Malformed(
                "model has no trainable layers".into(),
            ));
        }

        Ok(Self {
            window_size: artifact.window_size,
            n_features: artifact.n_features,
            layers,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Run the forward pass on a row-major `(window_size, n_features)` matrix.
    pub fn forward(&self, input: &[f64], rows: usize, cols: usize) -> Result<Vec<f64>> {
        if (rows, cols) != (self.window_size, self.n_features)
            || rows.checked_mul(cols) != Some(input.len())
        {
            return Err(ArtifactError::InputShape {
                expected: (self.window_size, self.n_features),
                actual: (rows, cols),
            });
        }
        let mut x = Tensor::Seq(input.chunks(cols).map(<[f64]>::to_vec).collect());

        for layer in &self.layers {
            x = match (layer, x) {
                (Layer::Lstm(l), Tensor::Seq(seq)) => {
                    debug_assert!(seq.iter().all(|s| s.len() == l.input_dim));
                    l.forward(&seq)
                }
                (Layer::Lstm(_), Tensor::Flat(_)) => {
                    // Rejected in from_artifact.
                    return Err(ArtifactError::Malformed(
                        "lstm layer received flat input".into(),
                    ));
                }
                (Layer::Dense(d), Tensor::Flat(v)) => {
                    debug_assert_eq!(v.len(), d.input_dim);
                    Tensor::Flat(d.forward_vec(&v))
                }
                // Dense over a sequence is applied per timestep.
                (Layer::Dense(d), Tensor::Seq(seq)) => {
                    Tensor::Seq(seq.iter().map(|s| d.forward_vec(s)).collect())
                }
            };
        }

        Ok(match x {
            Tensor::Flat(v) => v,
            Tensor::Seq(seq) => seq.into_iter().flatten().collect(),
        })
    }

    /// Width of the final layer's output per timestep.
    pub fn output_units(&self) -> usize {
        match self.layers.last() {
            Some(Layer::Lstm(l)) => l.units,
            Some(Layer::Dense(d)) => d.units,
            None => 0,
        }
    }
}

impl SequenceModel for SequenceRegressor {
    fn input_shape(&self) -> Option<(usize, usize)> {
        Some((self.window_size, self.n_features))
    }

    fn predict(
        &self,
        input: &[f64],
        rows: usize,
        cols: usize,
    ) -> std::result::Result<Vec<f64>, BoxError> {
        Ok(self.forward(input, rows, cols)?)
    }
}

/// Parse a model from JSON text.
pub fn parse_model(json: &str) -> Result<SequenceRegressor> {
    let artifact: ModelArtifact = serde_json::from_str(json)?;
    SequenceRegressor::from_artifact(artifact)
}

/// Load a model from a JSON file.
pub fn load_model(path: &std::path::Path) -> Result<SequenceRegressor> {
    let text = std::fs::read_to_string(path)?;
    let model = parse_model(&text)?;
    tracing::debug!(
        path = %path.display(),
        window_size = model.window_size,
        n_features = model.n_features,
        layers = model.layers.len(),
        "model loaded"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_unit_model(window: usize, kernel: f64, recurrent: f64) -> SequenceRegressor {
        let json = format!(
            r#"{{
                "window_size": {window}, "n_features": 1,
                "layers": [
                    {{"type":"lstm","units":1,"kernel":[[{kernel},{kernel},{kernel},{kernel}]],
                      "recurrent_kernel":[[{recurrent},{recurrent},{recurrent},{recurrent}]],
                      "bias":[0,0,0,0]}},
                    {{"type":"dropout","rate":0.2}},
                    {{"type":"dense","units":1,"kernel":[[1.0]],"bias":[0.0]}}
                ]
            }}"#
        );
        parse_model(&json).unwrap()
    }

    #[test]
    fn one_step_matches_hand_computed_cell() {
        let m = single_unit_model(1, 1.0, 0.0);
        let out = m.forward(&[1.0], 1, 1).unwrap();
        let s = sigmoid(1.0);
        let c = s * 1.0_f64.tanh();
        let want = s * c.tanh();
        assert_eq!(out.len(), 1);
        assert!((out[0] - want).abs() < 1e-12);
    }

    #[test]
    fn hidden_state_carries_across_timesteps() {
        let m = single_unit_model(2, 1.0, 0.5);
        let out = m.forward(&[1.0, 0.0], 2, 1).unwrap();

        // t = 0
        let s = sigmoid(1.0);
        let c1 = s * 1.0_f64.tanh();
        let h1 = s * c1.tanh();
        // t = 1: x = 0, so only the recurrent term contributes
        let z = 0.5 * h1;
        let g = sigmoid(z);
        let c2 = g * c1 + g * z.tanh();
        let h2 = g * c2.tanh();
        assert!((out[0] - h2).abs() < 1e-12, "{} vs {}", out[0], h2);
    }

    #[test]
    fn zero_weights_yield_dense_bias() {
        let json = r#"{
            "window_size": 3, "n_features": 3,
            "layers": [
                {"type":"lstm","units":1,"kernel":[[0,0,0,0],[0,0,0,0],[0,0,0,0]],
                 "recurrent_kernel":[[0,0,0,0]],"bias":[0,0,0,0]},
                {"type":"dense","units":1,"kernel":[[0.0]],"bias":[0.42]}
            ]
        }"#;
        let m = parse_model(json).unwrap();
        let out = m
            .forward(&[3.7, -1.0, 25.0, 3.6, -1.1, 25.5, 3.5, -1.2, 26.0], 3, 3)
            .unwrap();
        assert_eq!(out, vec![0.42]);
        assert_eq!(m.input_shape(), Some((3, 3)));
        assert_eq!(m.output_units(), 1);
    }

    #[test]
    fn return_sequences_without_head_is_not_scalar() {
        let json = r#"{
            "window_size": 2, "n_features": 1,
            "layers": [
                {"type":"lstm","units":1,"kernel":[[0,0,0,0]],
                 "recurrent_kernel":[[0,0,0,0]],"bias":[0,0,0,0],"return_sequences":true}
            ]
        }"#;
        let m = parse_model(json).unwrap();
        assert_eq!(m.forward(&[1.0, 2.0], 2, 1).unwrap().len(), 2);
    }

    #[test]
    fn rejects_wrong_input_shape() {
        let m = single_unit_model(2, 1.0, 0.0);
        let err = m.forward(&[1.0, 2.0, 3.0], 3, 1).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::InputShape {
                expected: (2, 1),
                actual: (3, 1)
            }
        ));
    }

    #[test]
    fn rejects_bad_weight_dimensions() {
        let json = r#"{
            "window_size": 2, "n_features": 2,
            "layers": [
                {"type":"lstm","units":1,"kernel":[[0,0,0,0]],
                 "recurrent_kernel":[[0,0,0,0]],"bias":[0,0,0,0]}
            ]
        }"#;
        let err = parse_model(json).unwrap_err();
        assert!(format!("{err}").contains("expected 2 rows"), "{err}");
    }

    #[test]
    fn rejects_lstm_after_flat_output() {
        let json = r#"{
            "window_size": 2, "n_features": 1,
            "layers": [
                {"type":"lstm","units":1,"kernel":[[0,0,0,0]],
                 "recurrent_kernel":[[0,0,0,0]],"bias":[0,0,0,0]},
                {"type":"lstm","units":1,"kernel":[[0,0,0,0]],
                 "recurrent_kernel":[[0,0,0,0]],"bias":[0,0,0,0]}
            ]
        }"#;
        let err = parse_model(json).unwrap_err();
        assert!(format!("{err}").contains("needs sequence input"), "{err}");
    }

    #[test]
    fn oversized_units_are_malformed_not_a_panic() {
        for units in ["576460752303423488", "9223372036854775807", "18446744073709551615"] {
            let json = format!(
                r#"{{"window_size":1,"n_features":1,"layers":[
                    {{"type":"lstm","units":{units},"kernel":[[0]],"recurrent_kernel":[],"bias":[]}}
                ]}}"#
            );
            let err = parse_model(&json).unwrap_err();
            assert!(matches!(err, ArtifactError::Malformed(_)), "units={units}: {err}");
        }
    }

    #[test]
    fn oversized_dense_units_are_malformed() {
        let json = r#"{"window_size":1,"n_features":1,"layers":[
            {"type":"dense","units":18446744073709551615,"kernel":[[0]],"bias":[0]}
        ]}"#;
        assert!(matches!(parse_model(json), Err(ArtifactError::Malformed(_))));
    }

    #[test]
    fn rejects_model_without_layers() {
        let json = r#"{"window_size": 2, "n_features": 1, "layers": [{"type":"dropout","rate":0.1}]}"#;
        assert!(matches!(
            parse_model(json),
            Err(ArtifactError::Malformed(_))
        ));
    }
}
