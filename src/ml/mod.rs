//! Classifier artifacts and the seam the prediction service calls through.
//!
//! Models are trained offline and exported to a portable format. The service
//! only evaluates them: no training, no mutation after load.

pub mod dense;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod tree;

pub use dense::{Activation, DenseLayer, DenseNetwork};
#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;
pub use tree::TreeEnsemble;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::domain::num_labels;
use crate::error::{PredictError, Result};

/// Artifact formats the service can evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    /// XGBoost `save_model` JSON
    Xgboost,
    /// Dense network JSON
    Dense,
    Onnx,
}

impl std::str::FromStr for ModelFormat {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xgboost" | "xgb" => Ok(Self::Xgboost),
            "dense" | "mlp" => Ok(Self::Dense),
            "onnx" => Ok(Self::Onnx),
            other => Err(PredictError::Validation(format!(
                "unknown model format {other:?} (expected xgboost, dense or onnx)"
            ))),
        }
    }
}

/// A loaded, read-only classifier over a fixed-length feature vector.
#[cfg_attr(test, mockall::automock)]
pub trait Classifier: Send + Sync {
    fn format(&self) -> ModelFormat;

    /// Length of the feature vector the model expects.
    fn num_features(&self) -> usize;

    /// Number of classes the model can emit.
    fn num_classes(&self) -> usize;

    /// Column names recorded at training time; empty when the artifact has none.
    fn feature_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Predicted class index for one feature vector.
    fn predict_class(&self, features: &[f32]) -> Result<u32>;
}

/// Work out the artifact format from its extension or JSON shape.
pub fn detect_format(path: &Path) -> Result<ModelFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    if ext.as_deref() == Some("onnx") {
        return Ok(ModelFormat::Onnx);
    }

    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    if value.get("learner").is_some() {
        Ok(ModelFormat::Xgboost)
    } else if value.get("layers").is_some() {
        Ok(ModelFormat::Dense)
    } else {
        Err(PredictError::Model(format!(
            "cannot infer model format of {}",
            path.display()
        )))
    }
}

/// Load a classifier artifact and check it matches the request schema: one
/// input per entry of `feature_order`, one output class per label.
pub fn load_classifier(
    path: &Path,
    format: Option<ModelFormat>,
    feature_order: &[&str],
) -> Result<Arc<dyn Classifier>> {
    let expected_features = feature_order.len();

    if !path.exists() {
        return Err(PredictError::Model(format!(
            "model artifact not found: {}",
            path.display()
        )));
    }

    let format = match format {
        Some(f) => f,
        None => detect_format(path)?,
    };

    let classifier: Arc<dyn Classifier> = match format {
        ModelFormat::Xgboost => Arc::new(TreeEnsemble::from_file(path)?),
        ModelFormat::Dense => Arc::new(DenseNetwork::from_file(path)?),
        #[cfg(feature = "onnx")]
        ModelFormat::Onnx => Arc::new(OnnxModel::load_for_vec_input(path, expected_features)?),
        #[cfg(not(feature = "onnx"))]
        ModelFormat::Onnx => {
            return Err(PredictError::Model(
                "ONNX support not compiled in (rebuild with --features onnx)".to_string(),
            ))
        }
    };

    if classifier.num_features() != expected_features {
        return Err(PredictError::Model(format!(
            "model expects {} features, request schema has {}",
            classifier.num_features(),
            expected_features
        )));
    }
    if classifier.num_classes() != num_labels() {
        return Err(PredictError::Model(format!(
            "model emits {} classes, label table has {}",
            classifier.num_classes(),
            num_labels()
        )));
    }

    let trained_on = classifier.feature_names();
    let same_order = trained_on
        .iter()
        .map(String::as_str)
        .eq(feature_order.iter().copied());
    if !trained_on.is_empty() && !same_order {
        return Err(PredictError::Model(format!(
            "model was trained on columns [{}], requests are encoded as [{}]",
            trained_on.join(", "),
            feature_order.join(", ")
        )));
    }

    Ok(classifier)
}

/// Index of the largest finite score; ties resolve to the lowest index.
pub(crate) fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        if !s.is_finite() {
            continue;
        }
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}
