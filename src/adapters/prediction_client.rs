//! HTTP client for the prediction API.
//!
//! One request per call, no retries. Non-success responses are turned into
//! `PredictError::Api` carrying the server's `detail` when it sent one.

use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::api::types::{ErrorResponse, PredictionResponse, WelcomeResponse};
use crate::domain::label_for;
use crate::error::{PredictError, Result};

/// A prediction together with its display label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPrediction {
    pub class_index: i64,
    pub label: &'static str,
}

#[derive(Clone)]
pub struct PredictionClient {
    http: Client,
    base_url: Url,
}

impl PredictionClient {
    pub fn new(base_url: &str) -> Result<Self> {
        // Trailing slash so `join` appends instead of replacing the last segment.
        let normalized = format!("{}/", base_url.trim().trim_end_matches('/'));
        let base_url = Url::parse(&normalized)?;

        let http = Client::builder()
            .user_agent(concat!("obesity-predict/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PredictError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET / -- welcome message
    pub async fn welcome(&self) -> Result<String> {
        let url = self.base_url.join("")?;
        let response = self.http.get(url).send().await?;
        let body: WelcomeResponse = Self::check(response).await?.json().await?;
        Ok(body.message)
    }

    /// POST /predict -- raw class index
    ///
    /// Takes any serializable payload so unvalidated JSON can be forwarded and
    /// judged by the server.
    pub async fn predict<T: Serialize + ?Sized>(&self, request: &T) -> Result<i64> {
        let url = self.base_url.join("predict")?;
        debug!(%url, "Submitting prediction request");

        let response = self.http.post(url).json(request).send().await?;
        let body: PredictionResponse = Self::check(response).await?.json().await?;
        Ok(body.prediction)
    }

    /// POST /predict and decode the label, falling back to "Unknown".
    pub async fn predict_label<T: Serialize + ?Sized>(
        &self,
        request: &T,
    ) -> Result<LabeledPrediction> {
        let class_index = self.predict(request).await?;
        Ok(LabeledPrediction {
            class_index,
            label: label_for(class_index),
        })
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(PredictError::Api {
            status: status.as_u16(),
            detail: error_detail(status, &text),
        })
    }
}

/// Prefer the structured `detail`, then the raw body, then the status reason.
fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<ErrorResponse>(body) {
        if err.fields.is_empty() {
            return err.detail;
        }
        let fields: Vec<String> = err
            .fields
            .iter()
            .map(|f| format!("{}: {}", f.field, f.message))
            .collect();
        return format!("{} ({})", err.detail, fields.join("; "));
    }
    if !body.trim().is_empty() {
        return body.trim().to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_onto_base_url() {
        let client = PredictionClient::new("http://127.0.0.1:8000").unwrap();
        assert_eq!(
            client.base_url().join("predict").unwrap().as_str(),
            "http://127.0.0.1:8000/predict"
        );

        let prefixed = PredictionClient::new("http://example.com/obesity/").unwrap();
        assert_eq!(
            prefixed.base_url().join("predict").unwrap().as_str(),
            "http://example.com/obesity/predict"
        );
    }

    #[test]
    fn rejects_unparseable_url() {
        assert!(matches!(
            PredictionClient::new("not a url"),
            Err(PredictError::Url(_))
        ));
    }

    #[test]
    fn error_detail_prefers_structured_body() {
        let body = r#"{"error":"validation_error","detail":"missing field `Age`"}"#;
        assert_eq!(
            error_detail(StatusCode::UNPROCESSABLE_ENTITY, body),
            "missing field `Age`"
        );

        let with_fields = r#"{"error":"validation_error","detail":"out of range",
            "fields":[{"field":"TUE","message":"must be within [0, 2], got 5"}]}"#;
        assert_eq!(
            error_detail(StatusCode::UNPROCESSABLE_ENTITY, with_fields),
            "out of range (TUE: must be within [0, 2], got 5)"
        );
    }

    #[test]
    fn error_detail_falls_back_to_text_then_reason() {
        assert_eq!(error_detail(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
        assert_eq!(error_detail(StatusCode::NOT_FOUND, ""), "Not Found");
    }
}
