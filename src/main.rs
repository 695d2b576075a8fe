use clap::Parser;
use obesity_predict::adapters::{start_api_server, PredictionClient};
use obesity_predict::cli::{Cli, Commands};
use obesity_predict::client::{self, describe_error, OutputMode};
use obesity_predict::config::AppConfig;
use obesity_predict::error::{PredictError, Result};
use obesity_predict::services::PredictionService;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

mod main_runtime;

use main_runtime::{init_logging, init_logging_simple};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load_from(&cli.config)?;

    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            model,
            format,
            no_range_check,
        }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(model) = model {
                config.model.path = model;
            }
            if format.is_some() {
                config.model.format = format;
            }
            if no_range_check {
                config.validation.enforce_ranges = false;
            }
            init_logging(&config.logging);
            run_server(&config).await?;
        }
        Some(Commands::Form { api_url, json }) => {
            init_logging_simple();
            let api = PredictionClient::new(api_url.as_deref().unwrap_or(&config.client.api_url))?;
            client::run_form(&api, OutputMode::from_json_flag(json)).await?;
        }
        Some(Commands::Predict {
            payload,
            api_url,
            json,
        }) => {
            init_logging_simple();
            let api = PredictionClient::new(api_url.as_deref().unwrap_or(&config.client.api_url))?;
            run_predict_file(&api, &payload, OutputMode::from_json_flag(json)).await?;
        }
        Some(Commands::TestCases { api_url, json }) => {
            init_logging_simple();
            let api = PredictionClient::new(api_url.as_deref().unwrap_or(&config.client.api_url))?;
            let outcomes = client::run_test_cases(&api, OutputMode::from_json_flag(json)).await;
            let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
            if failed > 0 {
                return Err(PredictError::Internal(format!(
                    "{failed} of {} test cases failed",
                    outcomes.len()
                )));
            }
        }
        None => {
            init_logging(&config.logging);
            run_server(&config).await?;
        }
    }

    Ok(())
}

async fn run_server(config: &AppConfig) -> Result<()> {
    info!(
        model = %config.model.path.display(),
        enforce_ranges = config.validation.enforce_ranges,
        "Starting prediction service"
    );

    let service = match PredictionService::load(&config.model, &config.validation) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("Failed to load model: {}", e);
            return Err(e);
        }
    };

    start_api_server(service, &config.server.host, config.server.port).await
}

async fn run_predict_file(client: &PredictionClient, path: &Path, mode: OutputMode) -> Result<()> {
    let raw = std::fs::read_to_string(path)?;
    let payload: serde_json::Value = serde_json::from_str(&raw)?;

    match client.predict_label(&payload).await {
        Ok(prediction) => {
            client::output::print_prediction(&prediction, mode)?;
            Ok(())
        }
        Err(e) => {
            client::output::print_error(&describe_error("prediction", &e));
            Err(e)
        }
    }
}
