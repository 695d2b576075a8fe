use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{FieldError, PredictError};
use crate::services::ModelInfo;

pub const WELCOME_MESSAGE: &str = "Welcome to the Obesity Prediction API";

// ============================================================================
// Prediction Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Class index; signed so clients tolerate anything the server sends
    pub prediction: i64,
}

// ============================================================================
// System Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: i64,
    pub version: String,
    pub model: ModelInfo,
    pub enforce_ranges: bool,
    pub labels: Vec<&'static str>,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// Error returned from handlers, rendered as `ErrorResponse` JSON.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &str, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.to_string(),
                detail: detail.into(),
                fields: Vec::new(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let kind = match &rejection {
            JsonRejection::JsonDataError(_) => "validation_error",
            JsonRejection::JsonSyntaxError(_) => "invalid_json",
            JsonRejection::MissingJsonContentType(_) => "unsupported_media_type",
            _ => "invalid_body",
        };
        debug!(status = %rejection.status(), "Rejected request body: {}", rejection.body_text());
        ApiError::new(rejection.status(), kind, rejection.body_text())
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::InvalidFields(fields) => {
                debug!(?fields, "Request outside allowed ranges");
                let mut api = ApiError::new(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "validation_error",
                    "one or more fields are outside their allowed range",
                );
                api.body.fields = fields;
                api
            }
            PredictError::Validation(msg) => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg)
            }
            other => {
                error!("Prediction failed: {}", other);
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    other.to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_fields_map_to_422_with_field_list() {
        let api: ApiError =
            PredictError::InvalidFields(vec![FieldError::new("Age", "must be >= 15, got 3")])
                .into();
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.body.error, "validation_error");
        assert_eq!(api.body.fields.len(), 1);
        assert_eq!(api.body.fields[0].field, "Age");
    }

    #[test]
    fn model_errors_map_to_500() {
        let api: ApiError = PredictError::Model("bad tree".to_string()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body.error, "internal_error");
    }

    #[test]
    fn classifier_input_faults_are_server_errors() {
        use crate::ml::{Classifier, DenseNetwork};

        let net: DenseNetwork = serde_json::from_str(
            r#"{"input_dim": 2, "layers": [{"weights": [[1.0, 0.0], [0.0, 1.0]], "bias": [0.0, 0.0]}]}"#,
        )
        .unwrap();
        let api: ApiError = net.predict_class(&[1.0]).unwrap_err().into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn empty_field_list_is_omitted() {
        let body = ErrorResponse {
            error: "invalid_json".to_string(),
            detail: "EOF".to_string(),
            fields: Vec::new(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("fields").is_none());
    }
}
