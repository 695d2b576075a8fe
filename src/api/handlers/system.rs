use axum::{extract::State, Json};

use crate::api::{
    state::AppState,
    types::{HealthResponse, WelcomeResponse, WELCOME_MESSAGE},
};
use crate::domain::ObesityLevel;

/// GET / -- static welcome payload, doubles as a liveness check
pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.service.model_info(),
        enforce_ranges: state.service.enforces_ranges(),
        labels: ObesityLevel::ALL.iter().map(|l| l.label()).collect(),
    })
}
