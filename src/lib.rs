pub mod adapters;
pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod ml;
pub mod services;
pub mod validation;

pub use config::AppConfig;
pub use domain::{label_for, ObesityLevel, PredictionRequest};
pub use error::{PredictError, Result};
pub use services::PredictionService;
