pub mod encoding;
pub mod labels;
pub mod request;

pub use encoding::FeatureEncoding;
pub use labels::{label_for, num_labels, ObesityLevel, UNKNOWN_LABEL};
pub use request::{
    AlcoholFrequency, FeatureValue, Gender, NumericBounds, PredictionRequest, SnackFrequency,
    Transport, YesNo, CATEGORICAL_FIELDS, FEATURE_ORDER, NUMERIC_BOUNDS, NUM_FEATURES,
};
