pub mod api_server;
pub mod prediction_client;

pub use api_server::{start_api_server, start_api_server_background};
pub use prediction_client::{LabeledPrediction, PredictionClient};
