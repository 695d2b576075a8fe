//! Numeric encoding of a request into the classifier's input vector.
//!
//! Categorical answers become ordinal codes. The default codes follow the
//! label-encoder convention used at training time: choices sorted byte-wise,
//! position in that order is the code. An encoding file may override the codes
//! of any categorical column.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::request::{FeatureValue, PredictionRequest, CATEGORICAL_FIELDS, NUM_FEATURES};
use crate::error::{PredictError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureEncoding {
    codes: BTreeMap<String, BTreeMap<String, f32>>,
}

impl Default for FeatureEncoding {
    fn default() -> Self {
        let codes = CATEGORICAL_FIELDS
            .iter()
            .map(|(field, choices)| {
                let mut sorted: Vec<&str> = choices.to_vec();
                sorted.sort_unstable();
                let field_codes = sorted
                    .into_iter()
                    .enumerate()
                    .map(|(code, choice)| (choice.to_string(), code as f32))
                    .collect();
                (field.to_string(), field_codes)
            })
            .collect();
        Self { codes }
    }
}

impl FeatureEncoding {
    /// Default codes with per-column overrides read from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let overrides: BTreeMap<String, BTreeMap<String, f32>> = serde_json::from_str(&content)?;

        let mut encoding = Self::default();
        for (field, codes) in overrides {
            if !encoding.codes.contains_key(&field) {
                return Err(PredictError::Model(format!(
                    "encoding file names unknown categorical field {field}"
                )));
            }
            encoding.codes.insert(field, codes);
        }
        encoding.validate().map_err(PredictError::Model)?;
        Ok(encoding)
    }

    /// Every choice of every categorical column must have a finite code.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (field, choices) in CATEGORICAL_FIELDS.iter() {
            let Some(codes) = self.codes.get(*field) else {
                return Err(format!("no codes for categorical field {field}"));
            };
            for choice in choices.iter() {
                match codes.get(*choice) {
                    Some(code) if code.is_finite() => {}
                    Some(_) => return Err(format!("{field}.{choice} code must be finite")),
                    None => return Err(format!("{field} is missing a code for {choice:?}")),
                }
            }
        }
        Ok(())
    }

    pub fn code(&self, field: &str, choice: &str) -> Option<f32> {
        self.codes.get(field).and_then(|c| c.get(choice)).copied()
    }

    /// Build the fixed-order feature vector for one request.
    pub fn encode(&self, request: &PredictionRequest) -> Result<Vec<f32>> {
        let mut features = Vec::with_capacity(NUM_FEATURES);
        for (field, value) in request.ordered_values() {
            let encoded = match value {
                FeatureValue::Numeric(v) => v as f32,
                FeatureValue::Category(choice) => self.code(field, choice).ok_or_else(|| {
                    PredictError::Internal(format!("no encoding for {field}={choice}"))
                })?,
            };
            features.push(encoded);
        }
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::{
        AlcoholFrequency, Gender, SnackFrequency, Transport, YesNo,
    };

    fn request() -> PredictionRequest {
        PredictionRequest {
            gender: Gender::Female,
            age: 18,
            height: 1.59,
            weight: 40.0,
            family_history_with_overweight: YesNo::Yes,
            favc: YesNo::Yes,
            fcvc: 2.0,
            ncp: 1.0,
            caec: SnackFrequency::Frequently,
            smoke: YesNo::No,
            ch2o: 1.0,
            scc: YesNo::No,
            faf: 0.0,
            tue: 2.0,
            calc: AlcoholFrequency::No,
            mtrans: Transport::PublicTransportation,
        }
    }

    #[test]
    fn default_codes_are_sorted_choice_positions() {
        let enc = FeatureEncoding::default();
        assert_eq!(enc.code("Gender", "Female"), Some(0.0));
        assert_eq!(enc.code("Gender", "Male"), Some(1.0));
        // uppercase sorts before lowercase
        assert_eq!(enc.code("CAEC", "Always"), Some(0.0));
        assert_eq!(enc.code("CAEC", "Frequently"), Some(1.0));
        assert_eq!(enc.code("CAEC", "Sometimes"), Some(2.0));
        assert_eq!(enc.code("CAEC", "no"), Some(3.0));
        assert_eq!(enc.code("MTRANS", "Automobile"), Some(0.0));
        assert_eq!(enc.code("MTRANS", "Walking"), Some(4.0));
        assert!(enc.validate().is_ok());
    }

    #[test]
    fn encodes_in_training_order() {
        let features = FeatureEncoding::default().encode(&request()).unwrap();
        assert_eq!(features.len(), NUM_FEATURES);
        assert_eq!(
            features,
            vec![0.0, 18.0, 1.59, 40.0, 1.0, 1.0, 2.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 2.0, 2.0, 3.0]
        );
    }

    #[test]
    fn override_file_replaces_field_codes() {
        let path = std::env::temp_dir().join(format!("encoding-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"CALC": {"no": 0, "Sometimes": 1, "Frequently": 2}}"#,
        )
        .unwrap();
        let enc = FeatureEncoding::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(enc.code("CALC", "no"), Some(0.0));
        assert_eq!(enc.code("CALC", "Frequently"), Some(2.0));
        assert_eq!(enc.code("Gender", "Male"), Some(1.0));
    }

    #[test]
    fn override_missing_choice_is_rejected() {
        let path = std::env::temp_dir().join(format!("encoding-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"Gender": {"Male": 1}}"#).unwrap();
        let result = FeatureEncoding::from_file(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(PredictError::Model(_))));
    }
}
