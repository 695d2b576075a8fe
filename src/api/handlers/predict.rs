use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::api::{
    state::AppState,
    types::{ApiError, PredictionResponse},
};
use crate::domain::PredictionRequest;

/// POST /predict
///
/// Body rejections (missing field, wrong type, unknown choice) are turned into
/// `ApiError` before the service, and therefore the classifier, is touched.
pub async fn predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PredictionRequest>, JsonRejection>,
) -> std::result::Result<Json<PredictionResponse>, ApiError> {
    let Json(request) = payload?;
    let class = state.service.predict(&request)?;

    Ok(Json(PredictionResponse {
        prediction: i64::from(class),
    }))
}
