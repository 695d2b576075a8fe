use thiserror::Error;

/// Main error type for the prediction service and its client
#[derive(Error, Debug)]
pub enum PredictError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Non-success response from the prediction API
    #[error("API error {status}: {detail}")]
    Api { status: u16, detail: String },

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    /// One or more request fields outside their allowed domain
    #[error("Invalid fields: {}", format_fields(.0))]
    InvalidFields(Vec<FieldError>),

    // Model artifact errors
    #[error("Model error: {0}")]
    Model(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for PredictError
pub type Result<T> = std::result::Result<T, PredictError>;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl PredictError {
    /// True when the error came from failing to reach the API at all
    pub fn is_connection_error(&self) -> bool {
        match self {
            PredictError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_fields_display_lists_each_field() {
        let err = PredictError::InvalidFields(vec![
            FieldError::new("Age", "must be >= 15"),
            FieldError::new("FAF", "must be within [0, 3]"),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid fields: Age: must be >= 15; FAF: must be within [0, 3]"
        );
    }

    #[test]
    fn api_error_display() {
        let err = PredictError::Api {
            status: 422,
            detail: "missing field `Age`".to_string(),
        };
        assert_eq!(err.to_string(), "API error 422: missing field `Age`");
        assert!(!err.is_connection_error());
    }
}
