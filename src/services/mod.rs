pub mod prediction;

pub use prediction::{ModelInfo, PredictionService};
