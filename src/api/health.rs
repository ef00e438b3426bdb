use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::forecast::PredictorKind;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "EEU Demand Forecasting";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    predictor: PredictorHealth,
    dataset: DatasetHealth,
}

#[derive(Debug, Serialize)]
pub struct PredictorHealth {
    kind: PredictorKind,
    patterns_from_dataset: bool,
}

#[derive(Debug, Serialize)]
pub struct DatasetHealth {
    records: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let predictor = state.engine.predictor();
    let response = HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now(),
        checks: HealthChecks {
            predictor: PredictorHealth {
                kind: predictor.kind(),
                patterns_from_dataset: !predictor.patterns().is_default(),
            },
            dataset: DatasetHealth {
                records: state.repos.dataset.snapshot().len(),
            },
        },
    };
    (StatusCode::OK, Json(response))
}

/// GET /health/live
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
