//! ONNX classifier wrapper (pure Rust via `tract-onnx`).
//!
//! Handles the two output shapes classifier exporters produce: a score row
//! (class = argmax) or a single label tensor (class = the value itself).

use std::path::Path;

use super::{argmax, Classifier, ModelFormat};
use crate::error::{PredictError, Result};

use tract_onnx::prelude::*;

#[derive(Clone)]
pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
    input_shape: Vec<usize>,
    output_dim: usize,
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("input_shape", &self.input_shape)
            .field("output_dim", &self.output_dim)
            .finish()
    }
}

impl OnnxModel {
    /// Load an ONNX model and specialize it to a fixed `[1, input_dim]` f32 input.
    pub fn load_for_vec_input(path: &Path, input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(PredictError::Model("input_dim must be > 0".to_string()));
        }
        let input_shape = [1, input_dim];

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| PredictError::Model(format!("onnx load failed: {e}")))?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(1, input_dim)))
            .map_err(|e| PredictError::Model(format!("onnx input fact failed: {e}")))?;

        let plan = model
            .into_optimized()
            .map_err(|e| PredictError::Model(format!("onnx optimize failed: {e}")))?
            .into_runnable()
            .map_err(|e| PredictError::Model(format!("onnx runnable failed: {e}")))?;

        let mut loaded = Self {
            plan,
            input_shape: input_shape.to_vec(),
            output_dim: 0,
        };

        // Infer output_dim by running a dummy forward pass.
        loaded.output_dim = loaded.run(&vec![0.0; input_dim])?.len();
        if loaded.output_dim == 0 {
            return Err(PredictError::Model("onnx output has zero elements".to_string()));
        }

        Ok(loaded)
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Run inference on a single feature vector and return the first output.
    fn run(&self, input: &[f32]) -> Result<Vec<f32>> {
        let expected: usize = self.input_shape.iter().product();
        if input.len() != expected {
            return Err(PredictError::Model(format!(
                "onnx input dim mismatch: got {}, expected {} (shape={:?})",
                input.len(),
                expected,
                self.input_shape
            )));
        }

        let tensor = tract_ndarray::ArrayD::<f32>::from_shape_vec(
            tract_ndarray::IxDyn(&self.input_shape),
            input.to_vec(),
        )
        .map_err(|e| PredictError::Internal(format!("onnx input reshape failed: {e}")))?
        .into_tvalue();

        let outputs = self
            .plan
            .run(tvec!(tensor))
            .map_err(|e| PredictError::Model(format!("onnx run failed: {e}")))?;
        let first = outputs
            .first()
            .ok_or_else(|| PredictError::Model("onnx produced no outputs".to_string()))?;

        // Label outputs are usually int64; score outputs f32.
        let values = if let Ok(view) = first.to_array_view::<i64>() {
            view.iter().map(|v| *v as f32).collect()
        } else {
            first
                .to_array_view::<f32>()
                .map_err(|e| PredictError::Model(format!("onnx output decode failed: {e}")))?
                .iter()
                .copied()
                .collect()
        };
        Ok(values)
    }
}

impl Classifier for OnnxModel {
    fn format(&self) -> ModelFormat {
        ModelFormat::Onnx
    }

    fn num_features(&self) -> usize {
        self.input_shape.last().copied().unwrap_or(0)
    }

    fn num_classes(&self) -> usize {
        // A single label output does not reveal the class count.
        if self.output_dim == 1 {
            crate::domain::labels::num_labels()
        } else {
            self.output_dim
        }
    }

    fn predict_class(&self, features: &[f32]) -> Result<u32> {
        let out = self.run(features)?;
        if out.len() == 1 {
            let label = out[0];
            if !label.is_finite() || label < 0.0 || label.fract() != 0.0 {
                return Err(PredictError::Model(format!(
                    "onnx label output {label} is not a class index"
                )));
            }
            return Ok(label as u32);
        }
        argmax(&out)
            .map(|c| c as u32)
            .ok_or_else(|| PredictError::Model("onnx produced no finite scores".to_string()))
    }
}
