//! Prediction service: request → ordered feature vector → class index.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{ModelConfig, ValidationConfig};
use crate::domain::{label_for, FeatureEncoding, PredictionRequest, FEATURE_ORDER};
use crate::error::Result;
use crate::ml::{self, Classifier, ModelFormat};
use crate::validation::validate_request;

/// Summary of the loaded model, reported by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub format: ModelFormat,
    pub num_features: usize,
    pub num_classes: usize,
}

/// Holds the read-only classifier for the lifetime of the process.
pub struct PredictionService {
    classifier: Arc<dyn Classifier>,
    encoding: FeatureEncoding,
    enforce_ranges: bool,
}

impl PredictionService {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        encoding: FeatureEncoding,
        enforce_ranges: bool,
    ) -> Self {
        Self {
            classifier,
            encoding,
            enforce_ranges,
        }
    }

    /// Startup phase: load the artifact and encoding. Any failure here is fatal.
    pub fn load(model: &ModelConfig, validation: &ValidationConfig) -> Result<Self> {
        let classifier = ml::load_classifier(&model.path, model.format, &FEATURE_ORDER)?;
        let encoding = match &model.encoding_path {
            Some(path) => FeatureEncoding::from_file(path)?,
            None => FeatureEncoding::default(),
        };

        info!(
            path = %model.path.display(),
            format = ?classifier.format(),
            classes = classifier.num_classes(),
            enforce_ranges = validation.enforce_ranges,
            "Classifier loaded"
        );

        Ok(Self::new(classifier, encoding, validation.enforce_ranges))
    }

    /// Convenience for tests and tools: load an artifact with default settings.
    pub fn from_model_path(path: &Path) -> Result<Self> {
        let model = ModelConfig {
            path: path.to_path_buf(),
            format: None,
            encoding_path: None,
        };
        Self::load(&model, &ValidationConfig::default())
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            format: self.classifier.format(),
            num_features: self.classifier.num_features(),
            num_classes: self.classifier.num_classes(),
        }
    }

    pub fn enforces_ranges(&self) -> bool {
        self.enforce_ranges
    }

    /// Validate, arrange into training order, run the classifier.
    pub fn predict(&self, request: &PredictionRequest) -> Result<u32> {
        if self.enforce_ranges {
            validate_request(request)?;
        }

        let features = self.encoding.encode(request)?;
        debug!(?features, "Encoded feature vector");

        let class = self.classifier.predict_class(&features)?;
        info!(
            request_id = %Uuid::new_v4(),
            prediction = class,
            label = label_for(i64::from(class)),
            "Prediction result"
        );
        Ok(class)
    }
}
