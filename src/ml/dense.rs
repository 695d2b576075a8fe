//! Dense neural network classifier (CPU-only).
//!
//! Small MLPs exported to JSON. The class is the argmax of the final layer,
//! or a 0.5 threshold when the network has a single output unit.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{argmax, Classifier, ModelFormat};
use crate::error::{PredictError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Tanh,
    Sigmoid,
    /// Applied across the whole layer; usually the output layer of a classifier
    Softmax,
}

impl Activation {
    fn apply(self, units: &mut [f64]) {
        match self {
            Activation::Linear => {}
            Activation::Relu => units.iter_mut().for_each(|u| *u = u.max(0.0)),
            Activation::Tanh => units.iter_mut().for_each(|u| *u = u.tanh()),
            Activation::Sigmoid => units.iter_mut().for_each(|u| *u = sigmoid(*u)),
            Activation::Softmax => softmax(units),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// [out_dim][in_dim]
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn out_dim(&self) -> usize {
        self.weights.len()
    }

    fn check(&self, idx: usize, in_dim: usize) -> std::result::Result<(), String> {
        let out_dim = self.out_dim();
        if out_dim == 0 {
            return Err(format!("layer[{idx}] has no units"));
        }
        if self.bias.len() != out_dim {
            return Err(format!(
                "layer[{idx}] has {} biases for {out_dim} units",
                self.bias.len()
            ));
        }
        if let Some(r) = self.weights.iter().position(|row| row.len() != in_dim) {
            return Err(format!(
                "layer[{idx}] unit {r} has {} weights, expected {in_dim}",
                self.weights[r].len()
            ));
        }
        let finite = self
            .weights
            .iter()
            .flatten()
            .chain(&self.bias)
            .all(|v| v.is_finite());
        if !finite {
            return Err(format!("layer[{idx}] has non-finite parameters"));
        }
        Ok(())
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut units: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| row.iter().zip(input).fold(*bias, |acc, (w, x)| acc + w * x))
            .collect();
        self.activation.apply(&mut units);
        units
    }
}

/// Multi-layer perceptron stored as JSON.
///
/// Inputs are the encoded feature vector, optionally z-scored with the
/// training statistics before the first layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseNetwork {
    pub input_dim: usize,

    #[serde(default)]
    pub input_mean: Option<Vec<f64>>,
    #[serde(default)]
    pub input_std: Option<Vec<f64>>,

    pub layers: Vec<DenseLayer>,

    /// Training provenance; not interpreted
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl DenseNetwork {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let model: Self = serde_json::from_str(&content)?;
        model.validate().map_err(PredictError::Model)?;
        Ok(model)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.input_dim == 0 {
            return Err("input_dim must be > 0".to_string());
        }
        if self.layers.is_empty() {
            return Err("network has no layers".to_string());
        }
        match (&self.input_mean, &self.input_std) {
            (None, None) => {}
            (Some(mean), Some(std)) => {
                if mean.len() != self.input_dim || std.len() != self.input_dim {
                    return Err(format!(
                        "normalization vectors must have input_dim {} entries",
                        self.input_dim
                    ));
                }
                if std.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                    return Err("input_std entries must be finite and > 0".to_string());
                }
            }
            _ => return Err("input_mean and input_std must be provided together".to_string()),
        }

        self.layers
            .iter()
            .enumerate()
            .try_fold(self.input_dim, |in_dim, (idx, layer)| {
                layer.check(idx, in_dim).map(|_| layer.out_dim())
            })
            .map(|_| ())
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map(|l| l.out_dim()).unwrap_or(0)
    }

    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_dim {
            return Err(PredictError::Model(format!(
                "DenseNetwork input dim mismatch: got {}, expected {}",
                input.len(),
                self.input_dim
            )));
        }

        let mut x = input.to_vec();
        if let (Some(mean), Some(std)) = (&self.input_mean, &self.input_std) {
            for ((v, m), s) in x.iter_mut().zip(mean).zip(std) {
                *v = (*v - m) / s;
            }
        }

        Ok(self.layers.iter().fold(x, |acc, layer| layer.forward(&acc)))
    }
}

impl Classifier for DenseNetwork {
    fn format(&self) -> ModelFormat {
        ModelFormat::Dense
    }

    fn num_features(&self) -> usize {
        self.input_dim
    }

    fn num_classes(&self) -> usize {
        match self.output_dim() {
            1 => 2,
            n => n,
        }
    }

    fn predict_class(&self, features: &[f32]) -> Result<u32> {
        let input: Vec<f64> = features.iter().map(|v| f64::from(*v)).collect();
        let out = self.forward(&input)?;

        if let [p] = out.as_slice() {
            return Ok(u32::from(*p > 0.5));
        }

        let scores: Vec<f32> = out.iter().map(|v| *v as f32).collect();
        argmax(&scores)
            .map(|i| i as u32)
            .ok_or_else(|| PredictError::Model("network produced no finite scores".to_string()))
    }
}

fn sigmoid(x: f64) -> f64 {
    // Stable for large |x|
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

fn softmax(units: &mut [f64]) {
    let max = units.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for u in units.iter_mut() {
        *u = (*u - max).exp();
        total += *u;
    }
    if total > 0.0 {
        units.iter_mut().for_each(|u| *u /= total);
    }
}
