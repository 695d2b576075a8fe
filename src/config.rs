use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ml::ModelFormat;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    pub client: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind (e.g., "0.0.0.0")
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Classifier artifact, loaded once at startup
    pub path: PathBuf,
    /// Artifact format; inferred from the file when unset
    #[serde(default)]
    pub format: Option<ModelFormat>,
    /// Optional JSON file overriding categorical codes
    #[serde(default)]
    pub encoding_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    /// Reject requests whose numeric fields fall outside the form's domains
    #[serde(default = "default_enforce_ranges")]
    pub enforce_ranges: bool,
}

fn default_enforce_ranges() -> bool {
    true
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enforce_ranges: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the prediction API
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rolling log files
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("model.path", "models/demo_xgb.json")?
            .set_default("validation.enforce_ranges", true)?
            .set_default("client.api_url", "http://127.0.0.1:8000")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("OBESITY_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (OBESITY_SERVER__PORT, etc.)
            .add_source(
                Environment::with_prefix("OBESITY")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}
